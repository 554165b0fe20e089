use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ParticipantResponse, PrizeResponse};

/// 抽奖请求
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct DrawRequest {
    pub prize_id: i64,
    /// 中奖人数 (>= 1)
    pub winner_count: Option<i32>,
}

/// 某奖品当前可抽人数信息（用于前端限制输入）
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DrawOptionsResponse {
    pub prize_id: i64,
    /// 奖品剩余数量
    pub quantity: i32,
    /// 尚未获得该奖品的参与者数
    pub eligible_count: usize,
    /// 最多可抽人数 = min(quantity, eligible_count)
    pub max_winner_count: i32,
}

/// 单个中奖者
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DrawnWinner {
    /// 中奖记录ID
    pub winner_id: i64,
    pub participant_id: i64,
    pub name: String,
    pub email: String,
    pub prize: String,
    pub draw_date: DateTime<Utc>,
    pub notes: Option<String>,
}

/// 抽奖结果
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DrawResponse {
    /// 抽奖后的奖品 (数量已扣减)
    pub prize: PrizeResponse,
    pub winners: Vec<DrawnWinner>,
    pub remaining_quantity: i32,
}

pub type EligibleParticipantsResponse = Vec<ParticipantResponse>;
