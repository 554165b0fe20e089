use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::prize_entity;

/// 新建奖品请求
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreatePrizeRequest {
    /// 奖品名称 (唯一, 最长 100 字符)
    pub name: String,
    /// 描述 (最长 500 字符)
    #[serde(default)]
    pub description: Option<String>,
    /// 数量 (1-1000)
    pub quantity: i32,
    /// 图片引用
    #[serde(default)]
    pub image_url: Option<String>,
}

/// 奖品列表查询参数
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct PrizeQuery {
    /// 仅返回仍有数量的奖品 (默认 false)
    #[serde(default)]
    pub available_only: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PrizeResponse {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// 剩余数量
    pub quantity: i32,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<prize_entity::Model> for PrizeResponse {
    fn from(m: prize_entity::Model) -> Self {
        PrizeResponse {
            id: m.id,
            name: m.name,
            description: m.description,
            quantity: m.quantity,
            image_url: m.image_url,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
