use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::config::DrawConfig;
use crate::entities::{
    participant_entity as participants, prize_entity as prizes, winner_entity as winners,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    DrawOptionsResponse, DrawRequest, DrawResponse, DrawnWinner, EligibleParticipantsResponse,
};
use crate::store::{DrawCommit, SharedStore, StoreError};
use crate::utils::sample;

type PrizeLock = Arc<tokio::sync::Mutex<()>>;
type PrizeLockMap = Arc<Mutex<HashMap<i64, PrizeLock>>>;

/// 锁表中某奖品的一项；drop 时（包括请求被取消）若已无人持有或等待则移除，避免锁表无限增长
struct PrizeLockEntry {
    locks: PrizeLockMap,
    prize_id: i64,
    lock: PrizeLock,
}

impl Drop for PrizeLockEntry {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // 锁表与自身各持有一份
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(&self.prize_id);
        }
    }
}

/// 一次成功抽奖的结果
#[derive(Debug, Clone)]
pub struct DrawOutcome {
    /// 提交后的奖品（数量已扣减）
    pub prize: prizes::Model,
    /// 中奖记录及对应参与者
    pub winners: Vec<(winners::Model, participants::Model)>,
}

#[derive(Clone)]
pub struct DrawService {
    store: SharedStore,
    config: DrawConfig,
    prize_locks: PrizeLockMap,
}

impl DrawService {
    pub fn new(store: SharedStore, config: DrawConfig) -> Self {
        Self {
            store,
            config,
            prize_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// 尚未获得该奖品的参与者（无副作用）
    pub async fn eligible_participants(&self, prize_id: i64) -> AppResult<Vec<participants::Model>> {
        self.find_prize(prize_id).await?;
        self.resolve_eligible(prize_id).await
    }

    pub async fn list_eligible(&self, prize_id: i64) -> AppResult<EligibleParticipantsResponse> {
        Ok(self
            .eligible_participants(prize_id)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// 当前最多可抽人数 = min(剩余数量, 可参与人数)
    pub async fn draw_options(&self, prize_id: i64) -> AppResult<DrawOptionsResponse> {
        let prize = self.find_prize(prize_id).await?;
        let eligible_count = self.resolve_eligible(prize_id).await?.len();
        let max_winner_count = prize
            .quantity
            .min(i32::try_from(eligible_count).unwrap_or(i32::MAX))
            .max(0);
        Ok(DrawOptionsResponse {
            prize_id,
            quantity: prize.quantity,
            eligible_count,
            max_winner_count,
        })
    }

    /// 抽奖，返回新建的中奖记录（顺序无业务含义）
    pub async fn select_winners(
        &self,
        prize_id: i64,
        winner_count: i32,
    ) -> AppResult<Vec<winners::Model>> {
        let outcome = self.execute_draw(prize_id, winner_count).await?;
        Ok(outcome.winners.into_iter().map(|(w, _)| w).collect())
    }

    /// HTTP 入口：抽奖并附带参与者/奖品信息
    pub async fn draw(&self, request: DrawRequest) -> AppResult<DrawResponse> {
        let winner_count = request
            .winner_count
            .ok_or_else(|| AppError::InvalidArgument("winner_count is required".into()))?;
        let outcome = self.execute_draw(request.prize_id, winner_count).await?;

        let prize_name = outcome.prize.name.clone();
        let winners = outcome
            .winners
            .into_iter()
            .map(|(winner, participant)| DrawnWinner {
                winner_id: winner.id,
                participant_id: participant.id,
                name: participant.name,
                email: participant.email,
                prize: prize_name.clone(),
                draw_date: winner.draw_date,
                notes: winner.notes,
            })
            .collect();

        Ok(DrawResponse {
            remaining_quantity: outcome.prize.quantity,
            prize: outcome.prize.into(),
            winners,
        })
    }

    /// 抽奖主流程
    ///
    /// 同一奖品的抽奖在进程内串行执行（按奖品加锁）；存储层再以
    /// "数量未变" 为条件提交，冲突时基于最新状态重新校验并抽取。
    pub async fn execute_draw(&self, prize_id: i64, winner_count: i32) -> AppResult<DrawOutcome> {
        if winner_count < 1 {
            return Err(AppError::InvalidArgument(
                "winner_count must be at least 1".into(),
            ));
        }

        let entry = self.prize_lock(prize_id);
        let _guard = entry.lock.lock().await;
        self.draw_locked(prize_id, winner_count).await
    }

    async fn draw_locked(&self, prize_id: i64, winner_count: i32) -> AppResult<DrawOutcome> {
        let max_attempts = self.config.max_commit_attempts.max(1);

        for attempt in 1..=max_attempts {
            let prize = self.find_prize(prize_id).await?;
            if prize.quantity < winner_count {
                return Err(AppError::InsufficientInventory {
                    requested: winner_count,
                    available: prize.quantity,
                });
            }

            let pool = self.resolve_eligible(prize_id).await?;
            if pool.len() < winner_count as usize {
                return Err(AppError::InsufficientParticipants {
                    requested: winner_count,
                    eligible: pool.len(),
                });
            }

            let selected = {
                let mut rng = rand::thread_rng();
                sample(&pool, winner_count as usize, &mut rng)
            };

            let commit = DrawCommit {
                prize_id,
                expected_quantity: prize.quantity,
                participant_ids: selected.iter().map(|p| p.id).collect(),
                draw_date: Utc::now(),
                notes: Some(self.config.default_note.clone()),
            };

            match self.store.commit_draw(commit).await {
                Ok(created) => {
                    log::info!(
                        "Draw committed: prize_id={} winners={} remaining={}",
                        prize_id,
                        created.len(),
                        prize.quantity - winner_count
                    );
                    let by_id: HashMap<i64, participants::Model> =
                        selected.into_iter().map(|p| (p.id, p)).collect();
                    let winners = created
                        .into_iter()
                        .filter_map(|w| by_id.get(&w.participant_id).cloned().map(|p| (w, p)))
                        .collect();
                    let mut prize = prize;
                    prize.quantity -= winner_count;
                    return Ok(DrawOutcome { prize, winners });
                }
                Err(StoreError::StaleDraw) => {
                    log::warn!(
                        "Draw state changed during commit, retrying: prize_id={} attempt={}/{}",
                        prize_id,
                        attempt,
                        max_attempts
                    );
                }
                Err(e) => {
                    log::error!("Draw commit failed: prize_id={prize_id} error={e}");
                    return Err(AppError::PersistenceError(e.to_string()));
                }
            }
        }

        Err(AppError::PersistenceError(format!(
            "Draw for prize {prize_id} could not be committed after {max_attempts} attempts"
        )))
    }

    async fn find_prize(&self, prize_id: i64) -> AppResult<prizes::Model> {
        self.store
            .get_prize(prize_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Prize {prize_id} not found")))
    }

    async fn resolve_eligible(&self, prize_id: i64) -> AppResult<Vec<participants::Model>> {
        let won: HashSet<i64> = self
            .store
            .winners_for_prize(prize_id)
            .await?
            .into_iter()
            .map(|w| w.participant_id)
            .collect();
        let mut list = self.store.list_participants().await?;
        list.retain(|p| !won.contains(&p.id));
        Ok(list)
    }

    fn prize_lock(&self, prize_id: i64) -> PrizeLockEntry {
        let mut locks = self.prize_locks.lock().unwrap_or_else(|e| e.into_inner());
        let lock = locks.entry(prize_id).or_default().clone();
        PrizeLockEntry {
            locks: self.prize_locks.clone(),
            prize_id,
            lock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::winner_entity;
    use crate::store::{
        GiveawayStore, MemoryStore, NewParticipant, NewPrize, StoreResult, WinnerRecord,
    };
    use async_trait::async_trait;
    use sea_orm::DbErr;
    use std::sync::atomic::{AtomicU32, Ordering};

    async fn add_prize(store: &MemoryStore, name: &str, quantity: i32) -> prizes::Model {
        store
            .insert_prize(NewPrize {
                name: name.to_string(),
                description: String::new(),
                quantity,
                image_url: None,
            })
            .await
            .unwrap()
    }

    async fn add_participants(store: &MemoryStore, count: usize) -> Vec<participants::Model> {
        let mut list = Vec::new();
        for i in 0..count {
            list.push(
                store
                    .insert_participant(NewParticipant {
                        name: format!("Participant {i}"),
                        email: format!("p{i}@example.com"),
                        phone: None,
                        address: None,
                    })
                    .await
                    .unwrap(),
            );
        }
        list
    }

    fn service(store: &MemoryStore) -> DrawService {
        DrawService::new(Arc::new(store.clone()), DrawConfig::default())
    }

    fn ids(list: &[participants::Model]) -> HashSet<i64> {
        list.iter().map(|p| p.id).collect()
    }

    #[tokio::test]
    async fn test_draw_all_participants() {
        let store = MemoryStore::new();
        let prize = add_prize(&store, "Voucher", 5).await;
        let people = add_participants(&store, 3).await;
        let service = service(&store);

        let winners = service.select_winners(prize.id, 3).await.unwrap();
        assert_eq!(winners.len(), 3);
        let won: HashSet<i64> = winners.iter().map(|w| w.participant_id).collect();
        assert_eq!(won, ids(&people));
        assert!(winners.iter().all(|w| w.prize_id == prize.id));
        assert!(winners.iter().all(|w| w.notes.as_deref() == Some("automatic draw")));

        let prize = store.get_prize(prize.id).await.unwrap().unwrap();
        assert_eq!(prize.quantity, 2);
        assert!(service.eligible_participants(prize.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insufficient_inventory_changes_nothing() {
        let store = MemoryStore::new();
        let prize = add_prize(&store, "iPhone", 1).await;
        add_participants(&store, 5).await;
        let before = store.snapshot().await;

        let err = service(&store).select_winners(prize.id, 2).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::InsufficientInventory {
                requested: 2,
                available: 1
            }
        ));
        assert_eq!(store.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_insufficient_participants_when_all_already_won() {
        let store = MemoryStore::new();
        let prize = add_prize(&store, "Headphone", 10).await;
        add_participants(&store, 2).await;
        let service = service(&store);
        service.select_winners(prize.id, 2).await.unwrap();
        let before = store.snapshot().await;

        let err = service.select_winners(prize.id, 1).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::InsufficientParticipants {
                requested: 1,
                eligible: 0
            }
        ));
        assert_eq!(store.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_validation_order() {
        let store = MemoryStore::new();
        let prize = add_prize(&store, "Laptop", 1).await;
        let service = service(&store);

        // 人数非法优先于奖品不存在
        assert!(matches!(
            service.select_winners(999, 0).await.unwrap_err(),
            AppError::InvalidArgument(_)
        ));
        assert!(matches!(
            service.select_winners(prize.id, -1).await.unwrap_err(),
            AppError::InvalidArgument(_)
        ));
        assert!(matches!(
            service.select_winners(999, 1).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        // 库存不足优先于参与者不足（此时没有参与者）
        assert!(matches!(
            service.select_winners(prize.id, 2).await.unwrap_err(),
            AppError::InsufficientInventory { .. }
        ));
        assert!(matches!(
            service.select_winners(prize.id, 1).await.unwrap_err(),
            AppError::InsufficientParticipants { .. }
        ));
    }

    #[tokio::test]
    async fn test_missing_winner_count_is_invalid() {
        let store = MemoryStore::new();
        let prize = add_prize(&store, "Laptop", 1).await;
        let err = service(&store)
            .draw(DrawRequest {
                prize_id: prize.id,
                winner_count: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_conservation_over_repeated_draws() {
        let store = MemoryStore::new();
        let prize = add_prize(&store, "Voucher 500K", 10).await;
        add_participants(&store, 8).await;
        let service = service(&store);

        let mut drawn = HashSet::new();
        for k in [3, 2, 3] {
            let eligible_before = ids(&service.eligible_participants(prize.id).await.unwrap());
            let quantity_before = store.get_prize(prize.id).await.unwrap().unwrap().quantity;

            let winners = service.select_winners(prize.id, k).await.unwrap();
            assert_eq!(winners.len(), k as usize);
            for w in &winners {
                assert!(eligible_before.contains(&w.participant_id));
                assert!(drawn.insert(w.participant_id), "participant drawn twice");
            }

            let quantity_after = store.get_prize(prize.id).await.unwrap().unwrap().quantity;
            assert_eq!(quantity_before - quantity_after, k);
        }
        assert_eq!(store.winners_for_prize(prize.id).await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_participant_may_win_different_prizes() {
        let store = MemoryStore::new();
        let laptop = add_prize(&store, "Laptop", 1).await;
        let phone = add_prize(&store, "Phone", 1).await;
        let people = add_participants(&store, 1).await;
        let service = service(&store);

        let first = service.select_winners(laptop.id, 1).await.unwrap();
        let second = service.select_winners(phone.id, 1).await.unwrap();
        assert_eq!(first[0].participant_id, people[0].id);
        assert_eq!(second[0].participant_id, people[0].id);
    }

    #[tokio::test]
    async fn test_eligible_participants_is_read_only() {
        let store = MemoryStore::new();
        let prize = add_prize(&store, "Laptop", 3).await;
        add_participants(&store, 4).await;
        let service = service(&store);
        service.select_winners(prize.id, 1).await.unwrap();

        let before = store.snapshot().await;
        let first = ids(&service.eligible_participants(prize.id).await.unwrap());
        let second = ids(&service.eligible_participants(prize.id).await.unwrap());
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert_eq!(store.snapshot().await, before);

        assert!(matches!(
            service.eligible_participants(999).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_draw_options() {
        let store = MemoryStore::new();
        let prize = add_prize(&store, "Headphone", 3).await;
        add_participants(&store, 5).await;
        let service = service(&store);

        let options = service.draw_options(prize.id).await.unwrap();
        assert_eq!(
            options,
            DrawOptionsResponse {
                prize_id: prize.id,
                quantity: 3,
                eligible_count: 5,
                max_winner_count: 3,
            }
        );

        service.select_winners(prize.id, 3).await.unwrap();
        let options = service.draw_options(prize.id).await.unwrap();
        assert_eq!(options.quantity, 0);
        assert_eq!(options.eligible_count, 2);
        assert_eq!(options.max_winner_count, 0);
    }

    #[tokio::test]
    async fn test_draw_response_contains_names() {
        let store = MemoryStore::new();
        let prize = add_prize(&store, "Laptop Gaming", 2).await;
        add_participants(&store, 2).await;

        let response = service(&store)
            .draw(DrawRequest {
                prize_id: prize.id,
                winner_count: Some(2),
            })
            .await
            .unwrap();
        assert_eq!(response.remaining_quantity, 0);
        assert_eq!(response.prize.quantity, 0);
        assert_eq!(response.winners.len(), 2);
        assert!(response.winners.iter().all(|w| w.prize == "Laptop Gaming"));
        assert!(response.winners.iter().all(|w| w.name.starts_with("Participant")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_draws_never_over_allocate() {
        let store = MemoryStore::new();
        let prize = add_prize(&store, "Last iPhone", 1).await;
        add_participants(&store, 5).await;
        let service = service(&store);
        let prize_id = prize.id;

        let a = tokio::spawn({
            let service = service.clone();
            async move { service.select_winners(prize_id, 1).await }
        });
        let b = tokio::spawn({
            let service = service.clone();
            async move { service.select_winners(prize_id, 1).await }
        });
        let results = [a.await.unwrap(), b.await.unwrap()];

        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        let failure = results.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert!(matches!(
            failure,
            AppError::InsufficientInventory {
                requested: 1,
                available: 0
            }
        ));

        let prize = store.get_prize(prize.id).await.unwrap().unwrap();
        assert_eq!(prize.quantity, 0);
        assert_eq!(store.winners_for_prize(prize.id).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_many_concurrent_draws_keep_invariants() {
        let store = MemoryStore::new();
        let prize = add_prize(&store, "Voucher", 10).await;
        let other = add_prize(&store, "Sticker", 10).await;
        add_participants(&store, 30).await;
        let service = service(&store);

        let mut handles = Vec::new();
        for i in 0..20 {
            let service = service.clone();
            let target = if i % 2 == 0 { prize.id } else { other.id };
            handles.push(tokio::spawn(async move {
                service.select_winners(target, 2).await
            }));
        }
        let mut committed = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                committed += 1;
            }
        }
        // 每个奖品 10 个名额, 每次抽 2 人 -> 各 5 次成功
        assert_eq!(committed, 10);

        for id in [prize.id, other.id] {
            let p = store.get_prize(id).await.unwrap().unwrap();
            assert_eq!(p.quantity, 0);
            let won = store.winners_for_prize(id).await.unwrap();
            assert_eq!(won.len(), 10);
            let unique: HashSet<i64> = won.iter().map(|w| w.participant_id).collect();
            assert_eq!(unique.len(), 10);
        }
    }

    /// 提交阶段按配置注入故障的存储
    struct FaultyStore {
        inner: MemoryStore,
        stale: bool,
        commit_calls: AtomicU32,
    }

    #[async_trait]
    impl GiveawayStore for FaultyStore {
        async fn get_prize(&self, id: i64) -> StoreResult<Option<prizes::Model>> {
            self.inner.get_prize(id).await
        }
        async fn list_prizes(&self) -> StoreResult<Vec<prizes::Model>> {
            self.inner.list_prizes().await
        }
        async fn count_available_prizes(&self) -> StoreResult<u64> {
            self.inner.count_available_prizes().await
        }
        async fn insert_prize(&self, prize: NewPrize) -> StoreResult<prizes::Model> {
            self.inner.insert_prize(prize).await
        }
        async fn delete_prize(&self, id: i64) -> StoreResult<bool> {
            self.inner.delete_prize(id).await
        }
        async fn get_participant(&self, id: i64) -> StoreResult<Option<participants::Model>> {
            self.inner.get_participant(id).await
        }
        async fn list_participants(&self) -> StoreResult<Vec<participants::Model>> {
            self.inner.list_participants().await
        }
        async fn count_participants(&self) -> StoreResult<u64> {
            self.inner.count_participants().await
        }
        async fn list_participants_page(
            &self,
            offset: u64,
            limit: u64,
        ) -> StoreResult<Vec<participants::Model>> {
            self.inner.list_participants_page(offset, limit).await
        }
        async fn insert_participant(
            &self,
            participant: NewParticipant,
        ) -> StoreResult<participants::Model> {
            self.inner.insert_participant(participant).await
        }
        async fn delete_participant(&self, id: i64) -> StoreResult<bool> {
            self.inner.delete_participant(id).await
        }
        async fn count_winners(&self, prize_id: Option<i64>) -> StoreResult<u64> {
            self.inner.count_winners(prize_id).await
        }
        async fn list_winner_records(
            &self,
            prize_id: Option<i64>,
            offset: u64,
            limit: u64,
        ) -> StoreResult<Vec<WinnerRecord>> {
            self.inner.list_winner_records(prize_id, offset, limit).await
        }
        async fn winners_for_prize(&self, prize_id: i64) -> StoreResult<Vec<winner_entity::Model>> {
            self.inner.winners_for_prize(prize_id).await
        }
        async fn commit_draw(&self, _draw: DrawCommit) -> StoreResult<Vec<winner_entity::Model>> {
            self.commit_calls.fetch_add(1, Ordering::SeqCst);
            if self.stale {
                Err(StoreError::StaleDraw)
            } else {
                Err(StoreError::Database(DbErr::Custom("disk full".into())))
            }
        }
    }

    #[tokio::test]
    async fn test_commit_failure_surfaces_persistence_error() {
        let inner = MemoryStore::new();
        let prize = add_prize(&inner, "Laptop", 2).await;
        add_participants(&inner, 3).await;
        let before = inner.snapshot().await;

        let store = Arc::new(FaultyStore {
            inner: inner.clone(),
            stale: false,
            commit_calls: AtomicU32::new(0),
        });
        let service = DrawService::new(store.clone(), DrawConfig::default());

        let err = service.select_winners(prize.id, 2).await.unwrap_err();
        assert!(matches!(err, AppError::PersistenceError(_)));
        assert_eq!(store.commit_calls.load(Ordering::SeqCst), 1);
        assert_eq!(inner.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_stale_commits_are_retried_then_fail() {
        let inner = MemoryStore::new();
        let prize = add_prize(&inner, "Laptop", 2).await;
        add_participants(&inner, 3).await;
        let before = inner.snapshot().await;

        let store = Arc::new(FaultyStore {
            inner: inner.clone(),
            stale: true,
            commit_calls: AtomicU32::new(0),
        });
        let config = DrawConfig {
            max_commit_attempts: 4,
            ..DrawConfig::default()
        };
        let service = DrawService::new(store.clone(), config);

        let err = service.select_winners(prize.id, 1).await.unwrap_err();
        assert!(matches!(err, AppError::PersistenceError(_)));
        assert_eq!(store.commit_calls.load(Ordering::SeqCst), 4);
        assert_eq!(inner.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_prize_locks_are_released() {
        let store = MemoryStore::new();
        let prize = add_prize(&store, "Laptop", 2).await;
        add_participants(&store, 2).await;
        let service = service(&store);

        service.select_winners(prize.id, 1).await.unwrap();
        let _ = service.select_winners(prize.id, 5).await;
        assert!(service.prize_locks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_waiter_releases_prize_lock() {
        let store = MemoryStore::new();
        let prize = add_prize(&store, "Laptop", 2).await;
        add_participants(&store, 2).await;
        let service = service(&store);

        let holder = service.prize_lock(prize.id);
        let held = holder.lock.lock().await;

        // 等待锁的抽奖
        let mut waiter = Box::pin(service.select_winners(prize.id, 1));
        let timed_out =
            tokio::time::timeout(std::time::Duration::from_millis(20), &mut waiter).await;
        assert!(timed_out.is_err());

        drop(held);
        drop(holder);
        assert_eq!(service.prize_locks.lock().unwrap().len(), 1);

        // 请求被取消
        drop(waiter);
        assert!(service.prize_locks.lock().unwrap().is_empty());
        assert!(store.snapshot().await.winners.is_empty());
    }
}
