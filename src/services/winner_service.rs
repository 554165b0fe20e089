use crate::error::AppResult;
use crate::models::{DashboardResponse, PaginationParams, WinnerPageResponse, WinnerQuery};
use crate::store::SharedStore;

const RECENT_WINNERS_LIMIT: u64 = 5;

#[derive(Clone)]
pub struct WinnerService {
    store: SharedStore,
}

impl WinnerService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// 中奖历史（最新在前，可按奖品过滤）
    pub async fn list_winners(&self, query: &WinnerQuery) -> AppResult<WinnerPageResponse> {
        let params = PaginationParams::new(query.page, query.per_page);
        let total = self.store.count_winners(query.prize_id).await?;
        let list = self
            .store
            .list_winner_records(query.prize_id, params.get_offset(), params.get_limit())
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        Ok(params.to_response(list, total))
    }

    /// 首页统计：可用奖品数、参与者数、中奖数、最近 5 条中奖记录
    pub async fn dashboard(&self) -> AppResult<DashboardResponse> {
        let available_prizes = self.store.count_available_prizes().await?;
        let total_participants = self.store.count_participants().await?;
        let total_winners = self.store.count_winners(None).await?;
        let recent_winners = self
            .store
            .list_winner_records(None, 0, RECENT_WINNERS_LIMIT)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        Ok(DashboardResponse {
            available_prizes,
            total_participants,
            total_winners,
            recent_winners,
        })
    }
}
