//! 存储抽象
//!
//! 抽奖逻辑只依赖 [`GiveawayStore`]，因此同一套服务既可以跑在内存存储上，
//! 也可以跑在 sea-orm 数据库上。

pub mod database;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DbErr;
use std::sync::Arc;
use thiserror::Error;

use crate::entities::{
    participant_entity as participants, prize_entity as prizes, winner_entity as winners,
};

pub use database::DatabaseStore;
pub use memory::MemoryStore;

pub type StoreResult<T> = Result<T, StoreError>;

pub type SharedStore = Arc<dyn GiveawayStore>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    /// 提交时发现奖品数量或参与者状态已被其他操作修改
    #[error("Draw state changed before commit")]
    StaleDraw,
}

#[derive(Debug, Clone)]
pub struct NewPrize {
    pub name: String,
    pub description: String,
    pub quantity: i32,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewParticipant {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// 一次抽奖的提交内容
///
/// 只有当奖品数量仍等于 `expected_quantity`、所有参与者仍存在且都未获得过该奖品时，
/// 存储才会写入中奖记录并扣减数量；否则返回 [`StoreError::StaleDraw`] 且不做任何修改。
#[derive(Debug, Clone)]
pub struct DrawCommit {
    pub prize_id: i64,
    pub expected_quantity: i32,
    pub participant_ids: Vec<i64>,
    pub draw_date: DateTime<Utc>,
    pub notes: Option<String>,
}

/// 中奖记录及其奖品、参与者
#[derive(Debug, Clone, PartialEq)]
pub struct WinnerRecord {
    pub winner: winners::Model,
    pub prize: prizes::Model,
    pub participant: participants::Model,
}

#[async_trait]
pub trait GiveawayStore: Send + Sync {
    async fn get_prize(&self, id: i64) -> StoreResult<Option<prizes::Model>>;

    /// 按名称排序
    async fn list_prizes(&self) -> StoreResult<Vec<prizes::Model>>;

    /// 数量大于 0 的奖品数
    async fn count_available_prizes(&self) -> StoreResult<u64>;

    async fn insert_prize(&self, prize: NewPrize) -> StoreResult<prizes::Model>;

    /// 删除奖品及其全部中奖记录，返回是否存在
    async fn delete_prize(&self, id: i64) -> StoreResult<bool>;

    async fn get_participant(&self, id: i64) -> StoreResult<Option<participants::Model>>;

    /// 按 id 排序
    async fn list_participants(&self) -> StoreResult<Vec<participants::Model>>;

    async fn count_participants(&self) -> StoreResult<u64>;

    /// 按 id 排序的一页参与者
    async fn list_participants_page(
        &self,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<participants::Model>>;

    async fn insert_participant(
        &self,
        participant: NewParticipant,
    ) -> StoreResult<participants::Model>;

    /// 删除参与者及其全部中奖记录，返回是否存在
    async fn delete_participant(&self, id: i64) -> StoreResult<bool>;

    async fn count_winners(&self, prize_id: Option<i64>) -> StoreResult<u64>;

    /// 一页中奖记录（最新在前），连同奖品与参与者
    async fn list_winner_records(
        &self,
        prize_id: Option<i64>,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<WinnerRecord>>;

    async fn winners_for_prize(&self, prize_id: i64) -> StoreResult<Vec<winners::Model>>;

    /// 原子提交一次抽奖，返回新建的中奖记录（顺序与 `participant_ids` 一致）
    async fn commit_draw(&self, draw: DrawCommit) -> StoreResult<Vec<winners::Model>>;
}
