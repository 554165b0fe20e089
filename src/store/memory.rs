use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{
    DrawCommit, GiveawayStore, NewParticipant, NewPrize, StoreError, StoreResult, WinnerRecord,
};
use crate::entities::{
    participant_entity as participants, prize_entity as prizes, winner_entity as winners,
};

#[derive(Debug, Default)]
struct State {
    prizes: BTreeMap<i64, prizes::Model>,
    participants: BTreeMap<i64, participants::Model>,
    winners: BTreeMap<i64, winners::Model>,
    last_prize_id: i64,
    last_participant_id: i64,
    last_winner_id: i64,
}

/// 内存存储（无数据库配置时使用，也用于测试）
///
/// 所有写操作在同一把写锁内完成校验与修改，因此天然是原子的。
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

/// 存储内容快照，用于比较操作前后状态
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSnapshot {
    pub prizes: Vec<prizes::Model>,
    pub participants: Vec<participants::Model>,
    pub winners: Vec<winners::Model>,
}

fn page<T>(items: impl Iterator<Item = T>, offset: u64, limit: u64) -> Vec<T> {
    let offset = usize::try_from(offset).unwrap_or(usize::MAX);
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    items.skip(offset).take(limit).collect()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        let state = self.state.read().await;
        StoreSnapshot {
            prizes: state.prizes.values().cloned().collect(),
            participants: state.participants.values().cloned().collect(),
            winners: state.winners.values().cloned().collect(),
        }
    }
}

#[async_trait]
impl GiveawayStore for MemoryStore {
    async fn get_prize(&self, id: i64) -> StoreResult<Option<prizes::Model>> {
        Ok(self.state.read().await.prizes.get(&id).cloned())
    }

    async fn list_prizes(&self) -> StoreResult<Vec<prizes::Model>> {
        let mut list: Vec<prizes::Model> =
            self.state.read().await.prizes.values().cloned().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(list)
    }

    async fn count_available_prizes(&self) -> StoreResult<u64> {
        let state = self.state.read().await;
        Ok(state.prizes.values().filter(|p| p.is_available()).count() as u64)
    }

    async fn insert_prize(&self, prize: NewPrize) -> StoreResult<prizes::Model> {
        let mut state = self.state.write().await;
        if state.prizes.values().any(|p| p.name == prize.name) {
            return Err(StoreError::Duplicate(format!(
                "Prize name '{}' already exists",
                prize.name
            )));
        }

        state.last_prize_id += 1;
        let now = Utc::now();
        let model = prizes::Model {
            id: state.last_prize_id,
            name: prize.name,
            description: prize.description,
            quantity: prize.quantity,
            image_url: prize.image_url,
            created_at: now,
            updated_at: now,
        };
        state.prizes.insert(model.id, model.clone());
        Ok(model)
    }

    async fn delete_prize(&self, id: i64) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if state.prizes.remove(&id).is_none() {
            return Ok(false);
        }
        state.winners.retain(|_, w| w.prize_id != id);
        Ok(true)
    }

    async fn get_participant(&self, id: i64) -> StoreResult<Option<participants::Model>> {
        Ok(self.state.read().await.participants.get(&id).cloned())
    }

    async fn list_participants(&self) -> StoreResult<Vec<participants::Model>> {
        Ok(self
            .state
            .read()
            .await
            .participants
            .values()
            .cloned()
            .collect())
    }

    async fn count_participants(&self) -> StoreResult<u64> {
        Ok(self.state.read().await.participants.len() as u64)
    }

    async fn list_participants_page(
        &self,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<participants::Model>> {
        let state = self.state.read().await;
        Ok(page(state.participants.values().cloned(), offset, limit))
    }

    async fn insert_participant(
        &self,
        participant: NewParticipant,
    ) -> StoreResult<participants::Model> {
        let mut state = self.state.write().await;
        let email_lower = participant.email.to_lowercase();
        if state
            .participants
            .values()
            .any(|p| p.email.to_lowercase() == email_lower)
        {
            return Err(StoreError::Duplicate(format!(
                "Email '{}' is already registered",
                participant.email
            )));
        }

        state.last_participant_id += 1;
        let model = participants::Model {
            id: state.last_participant_id,
            name: participant.name,
            email: participant.email,
            phone: participant.phone,
            address: participant.address,
            created_at: Utc::now(),
        };
        state.participants.insert(model.id, model.clone());
        Ok(model)
    }

    async fn delete_participant(&self, id: i64) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if state.participants.remove(&id).is_none() {
            return Ok(false);
        }
        state.winners.retain(|_, w| w.participant_id != id);
        Ok(true)
    }

    async fn count_winners(&self, prize_id: Option<i64>) -> StoreResult<u64> {
        let state = self.state.read().await;
        Ok(state
            .winners
            .values()
            .filter(|w| prize_id.is_none_or(|id| w.prize_id == id))
            .count() as u64)
    }

    async fn list_winner_records(
        &self,
        prize_id: Option<i64>,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<WinnerRecord>> {
        let state = self.state.read().await;
        let mut list: Vec<&winners::Model> = state
            .winners
            .values()
            .filter(|w| prize_id.is_none_or(|id| w.prize_id == id))
            .collect();
        list.sort_by(|a, b| b.draw_date.cmp(&a.draw_date).then(b.id.cmp(&a.id)));

        // 删除总是级联, 奖品与参与者一定存在
        let records = list.into_iter().filter_map(|w| {
            Some(WinnerRecord {
                winner: w.clone(),
                prize: state.prizes.get(&w.prize_id)?.clone(),
                participant: state.participants.get(&w.participant_id)?.clone(),
            })
        });
        Ok(page(records, offset, limit))
    }

    async fn winners_for_prize(&self, prize_id: i64) -> StoreResult<Vec<winners::Model>> {
        Ok(self
            .state
            .read()
            .await
            .winners
            .values()
            .filter(|w| w.prize_id == prize_id)
            .cloned()
            .collect())
    }

    async fn commit_draw(&self, draw: DrawCommit) -> StoreResult<Vec<winners::Model>> {
        let mut state = self.state.write().await;
        let count = draw.participant_ids.len() as i32;

        // 先完成全部校验，再修改
        let quantity = match state.prizes.get(&draw.prize_id) {
            Some(prize) => prize.quantity,
            None => return Err(StoreError::StaleDraw),
        };
        if quantity != draw.expected_quantity || quantity < count {
            return Err(StoreError::StaleDraw);
        }

        let already_won: HashSet<i64> = state
            .winners
            .values()
            .filter(|w| w.prize_id == draw.prize_id)
            .map(|w| w.participant_id)
            .collect();
        let mut seen = HashSet::new();
        for participant_id in &draw.participant_ids {
            if !state.participants.contains_key(participant_id)
                || already_won.contains(participant_id)
                || !seen.insert(*participant_id)
            {
                return Err(StoreError::StaleDraw);
            }
        }

        let mut created = Vec::with_capacity(draw.participant_ids.len());
        for participant_id in draw.participant_ids {
            state.last_winner_id += 1;
            let winner = winners::Model {
                id: state.last_winner_id,
                prize_id: draw.prize_id,
                participant_id,
                draw_date: draw.draw_date,
                notes: draw.notes.clone(),
            };
            state.winners.insert(winner.id, winner.clone());
            created.push(winner);
        }

        if let Some(prize) = state.prizes.get_mut(&draw.prize_id) {
            prize.quantity -= count;
            prize.updated_at = Utc::now();
        }

        Ok(created)
    }
}
