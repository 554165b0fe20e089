//! 分页相关的数据结构

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ParticipantResponse, WinnerResponse};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct PaginationParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PaginationParams {
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self { page, per_page }
    }

    pub fn get_page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn get_per_page(&self) -> u32 {
        self.per_page
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// 在 u64 中计算, 超大页码不会溢出
    pub fn get_offset(&self) -> u64 {
        u64::from(self.get_page() - 1).saturating_mul(u64::from(self.get_per_page()))
    }

    pub fn get_limit(&self) -> u64 {
        u64::from(self.get_per_page())
    }

    /// 由存储层返回的当前页数据与总数构造分页响应
    pub fn to_response<T>(&self, data: Vec<T>, total: u64) -> PaginatedResponse<T> {
        PaginatedResponse::new(
            data,
            i64::from(self.get_page()),
            i64::from(self.get_per_page()),
            i64::try_from(total).unwrap_or(i64::MAX),
        )
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[aliases(
    ParticipantPageResponse = PaginatedResponse<ParticipantResponse>,
    WinnerPageResponse = PaginatedResponse<WinnerResponse>
)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, page: i64, page_size: i64, total: i64) -> Self {
        let total_pages = (total + page_size - 1) / page_size;
        Self {
            data,
            page,
            page_size,
            total,
            total_pages,
        }
    }
}
