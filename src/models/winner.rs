use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::store::WinnerRecord;

/// 中奖历史查询参数
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct WinnerQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// 按奖品过滤
    pub prize_id: Option<i64>,
}

/// 中奖记录（带奖品名和参与者名）
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct WinnerResponse {
    pub id: i64,
    pub prize_id: i64,
    pub prize_name: String,
    pub participant_id: i64,
    pub participant_name: String,
    pub participant_email: String,
    pub draw_date: DateTime<Utc>,
    pub notes: Option<String>,
}

impl From<WinnerRecord> for WinnerResponse {
    fn from(record: WinnerRecord) -> Self {
        Self {
            id: record.winner.id,
            prize_id: record.prize.id,
            prize_name: record.prize.name,
            participant_id: record.participant.id,
            participant_name: record.participant.name,
            participant_email: record.participant.email,
            draw_date: record.winner.draw_date,
            notes: record.winner.notes,
        }
    }
}

/// 首页统计
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardResponse {
    /// 仍有数量的奖品数
    pub available_prizes: u64,
    pub total_participants: u64,
    pub total_winners: u64,
    /// 最近 5 条中奖记录
    pub recent_winners: Vec<WinnerResponse>,
}

