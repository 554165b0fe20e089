use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use std::collections::HashMap;

use super::{
    DrawCommit, GiveawayStore, NewParticipant, NewPrize, StoreError, StoreResult, WinnerRecord,
};
use crate::entities::{
    participant_entity as participants, prize_entity as prizes, winner_entity as winners,
};

/// 基于 sea-orm 的存储实现
pub struct DatabaseStore {
    pool: DatabaseConnection,
}

impl DatabaseStore {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }
}

// Postgres 的 OFFSET 为 bigint
fn clamp_offset(offset: u64) -> u64 {
    offset.min(i64::MAX as u64)
}

/// 唯一索引冲突 -> Duplicate
fn map_insert_err(err: DbErr, message: String) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => StoreError::Duplicate(message),
        _ => StoreError::Database(err),
    }
}

/// 提交中奖记录时的约束冲突说明状态已被并发修改（参与者被删除 / 已中奖）
fn map_commit_err(err: DbErr) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_))
        | Some(SqlErr::ForeignKeyConstraintViolation(_)) => StoreError::StaleDraw,
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl GiveawayStore for DatabaseStore {
    async fn get_prize(&self, id: i64) -> StoreResult<Option<prizes::Model>> {
        Ok(prizes::Entity::find_by_id(id).one(&self.pool).await?)
    }

    async fn list_prizes(&self) -> StoreResult<Vec<prizes::Model>> {
        Ok(prizes::Entity::find()
            .order_by_asc(prizes::Column::Name)
            .order_by_asc(prizes::Column::Id)
            .all(&self.pool)
            .await?)
    }

    async fn count_available_prizes(&self) -> StoreResult<u64> {
        Ok(prizes::Entity::find()
            .filter(prizes::Column::Quantity.gt(0))
            .count(&self.pool)
            .await?)
    }

    async fn insert_prize(&self, prize: NewPrize) -> StoreResult<prizes::Model> {
        let now = Utc::now();
        let message = format!("Prize name '{}' already exists", prize.name);
        prizes::ActiveModel {
            name: Set(prize.name),
            description: Set(prize.description),
            quantity: Set(prize.quantity),
            image_url: Set(prize.image_url),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await
        .map_err(|e| map_insert_err(e, message))
    }

    async fn delete_prize(&self, id: i64) -> StoreResult<bool> {
        // 外键已设置级联删除，这里显式删除中奖记录以不依赖数据库配置
        let txn = self.pool.begin().await?;
        winners::Entity::delete_many()
            .filter(winners::Column::PrizeId.eq(id))
            .exec(&txn)
            .await?;
        let result = prizes::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok(result.rows_affected == 1)
    }

    async fn get_participant(&self, id: i64) -> StoreResult<Option<participants::Model>> {
        Ok(participants::Entity::find_by_id(id).one(&self.pool).await?)
    }

    async fn list_participants(&self) -> StoreResult<Vec<participants::Model>> {
        Ok(participants::Entity::find()
            .order_by_asc(participants::Column::Id)
            .all(&self.pool)
            .await?)
    }

    async fn count_participants(&self) -> StoreResult<u64> {
        Ok(participants::Entity::find().count(&self.pool).await?)
    }

    async fn list_participants_page(
        &self,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<participants::Model>> {
        Ok(participants::Entity::find()
            .order_by_asc(participants::Column::Id)
            .limit(limit)
            .offset(clamp_offset(offset))
            .all(&self.pool)
            .await?)
    }

    async fn insert_participant(
        &self,
        participant: NewParticipant,
    ) -> StoreResult<participants::Model> {
        let message = format!("Email '{}' is already registered", participant.email);
        participants::ActiveModel {
            name: Set(participant.name),
            email: Set(participant.email),
            phone: Set(participant.phone),
            address: Set(participant.address),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await
        .map_err(|e| map_insert_err(e, message))
    }

    async fn delete_participant(&self, id: i64) -> StoreResult<bool> {
        let txn = self.pool.begin().await?;
        winners::Entity::delete_many()
            .filter(winners::Column::ParticipantId.eq(id))
            .exec(&txn)
            .await?;
        let result = participants::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok(result.rows_affected == 1)
    }

    async fn count_winners(&self, prize_id: Option<i64>) -> StoreResult<u64> {
        let mut query = winners::Entity::find();
        if let Some(prize_id) = prize_id {
            query = query.filter(winners::Column::PrizeId.eq(prize_id));
        }
        Ok(query.count(&self.pool).await?)
    }

    /// 分页在数据库内完成：winners 左联 prizes，再按 id 批量读取当前页的参与者
    async fn list_winner_records(
        &self,
        prize_id: Option<i64>,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<WinnerRecord>> {
        let mut query = winners::Entity::find();
        if let Some(prize_id) = prize_id {
            query = query.filter(winners::Column::PrizeId.eq(prize_id));
        }
        let rows = query
            .order_by_desc(winners::Column::DrawDate)
            .order_by_desc(winners::Column::Id)
            .limit(limit)
            .offset(clamp_offset(offset))
            .find_also_related(prizes::Entity)
            .all(&self.pool)
            .await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let participant_ids: Vec<i64> = rows.iter().map(|(w, _)| w.participant_id).collect();
        let participant_map: HashMap<i64, participants::Model> = participants::Entity::find()
            .filter(participants::Column::Id.is_in(participant_ids))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        // 两次读取之间被级联删除的记录直接跳过
        Ok(rows
            .into_iter()
            .filter_map(|(winner, prize)| {
                let participant = participant_map.get(&winner.participant_id)?.clone();
                Some(WinnerRecord {
                    prize: prize?,
                    participant,
                    winner,
                })
            })
            .collect())
    }

    async fn winners_for_prize(&self, prize_id: i64) -> StoreResult<Vec<winners::Model>> {
        Ok(winners::Entity::find()
            .filter(winners::Column::PrizeId.eq(prize_id))
            .all(&self.pool)
            .await?)
    }

    /// 条件扣减 (where quantity = expected) + 插入中奖记录，同一事务内完成。
    /// 任一步失败时事务被丢弃（回滚），不会留下部分数据。
    async fn commit_draw(&self, draw: DrawCommit) -> StoreResult<Vec<winners::Model>> {
        let count = draw.participant_ids.len() as i32;
        let txn = self.pool.begin().await?;

        let update_result = prizes::Entity::update_many()
            .col_expr(
                prizes::Column::Quantity,
                Expr::col(prizes::Column::Quantity).sub(count),
            )
            .col_expr(prizes::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(prizes::Column::Id.eq(draw.prize_id))
            .filter(prizes::Column::Quantity.eq(draw.expected_quantity))
            .filter(prizes::Column::Quantity.gte(count))
            .exec(&txn)
            .await?;

        if update_result.rows_affected != 1 {
            return Err(StoreError::StaleDraw);
        }

        let mut created = Vec::with_capacity(draw.participant_ids.len());
        for participant_id in draw.participant_ids {
            let winner = winners::ActiveModel {
                prize_id: Set(draw.prize_id),
                participant_id: Set(participant_id),
                draw_date: Set(draw.draw_date),
                notes: Set(draw.notes.clone()),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(map_commit_err)?;
            created.push(winner);
        }

        txn.commit().await?;
        Ok(created)
    }
}
