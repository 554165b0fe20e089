use crate::error::{AppError, AppResult};
use crate::models::{CreatePrizeRequest, PrizeQuery, PrizeResponse};
use crate::store::{NewPrize, SharedStore};
use crate::utils::{
    NAME_MAX_LEN, TEXT_MAX_LEN, sanitize_optional, sanitize_text, validate_max_len,
    validate_prize_quantity, validate_required,
};

#[derive(Clone)]
pub struct PrizeService {
    store: SharedStore,
}

impl PrizeService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// 新建奖品（名称唯一，数量 1-1000）
    pub async fn create_prize(&self, request: CreatePrizeRequest) -> AppResult<PrizeResponse> {
        let name = sanitize_text(&request.name);
        validate_required("Prize name", &name, NAME_MAX_LEN)?;

        let description = sanitize_optional(request.description.as_deref()).unwrap_or_default();
        validate_max_len("Description", &description, TEXT_MAX_LEN)?;
        validate_prize_quantity(request.quantity)?;

        let image_url = sanitize_optional(request.image_url.as_deref());
        if let Some(url) = &image_url {
            validate_max_len("Image reference", url, TEXT_MAX_LEN)?;
        }

        let prize = self
            .store
            .insert_prize(NewPrize {
                name,
                description,
                quantity: request.quantity,
                image_url,
            })
            .await?;

        log::info!("Prize created: id={} name={}", prize.id, prize.name);
        Ok(prize.into())
    }

    /// 奖品列表（按名称排序），`available_only` 时只返回仍有数量的奖品
    pub async fn list_prizes(&self, query: &PrizeQuery) -> AppResult<Vec<PrizeResponse>> {
        let mut list = self.store.list_prizes().await?;
        if query.available_only {
            list.retain(|p| p.is_available());
        }
        Ok(list.into_iter().map(Into::into).collect())
    }

    pub async fn get_prize(&self, id: i64) -> AppResult<PrizeResponse> {
        self.store
            .get_prize(id)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::NotFound(format!("Prize {id} not found")))
    }

    /// 删除奖品，同时删除其全部中奖记录
    pub async fn delete_prize(&self, id: i64) -> AppResult<()> {
        if !self.store.delete_prize(id).await? {
            return Err(AppError::NotFound(format!("Prize {id} not found")));
        }
        log::info!("Prize deleted: id={id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn service() -> PrizeService {
        PrizeService::new(Arc::new(MemoryStore::new()))
    }

    fn request(name: &str, quantity: i32) -> CreatePrizeRequest {
        CreatePrizeRequest {
            name: name.to_string(),
            description: Some("Smartphone".to_string()),
            quantity,
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_prize() {
        let service = service();
        let created = service
            .create_prize(request("  iPhone 15 Pro ", 1))
            .await
            .unwrap();
        assert_eq!(created.name, "iPhone 15 Pro");
        assert_eq!(created.quantity, 1);

        let fetched = service.get_prize(created.id).await.unwrap();
        assert_eq!(fetched.name, created.name);
    }

    #[tokio::test]
    async fn test_create_prize_validation() {
        let service = service();
        for bad in [request("", 1), request("<>", 1), request("Laptop", 0), request("Laptop", 1001)] {
            let err = service.create_prize(bad).await.unwrap_err();
            assert!(matches!(err, AppError::ValidationError(_)));
        }

        let mut long_description = request("Laptop", 1);
        long_description.description = Some("x".repeat(501));
        assert!(matches!(
            service.create_prize(long_description).await.unwrap_err(),
            AppError::ValidationError(_)
        ));
    }

    #[tokio::test]
    async fn test_create_prize_duplicate_name() {
        let service = service();
        service.create_prize(request("Laptop", 1)).await.unwrap();
        let err = service.create_prize(request("Laptop", 2)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_missing_prize() {
        let err = service().delete_prize(42).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_available_only() {
        let store = Arc::new(MemoryStore::new());
        let service = PrizeService::new(store.clone());
        let voucher = service.create_prize(request("Voucher", 1)).await.unwrap();
        service.create_prize(request("Headphone", 3)).await.unwrap();

        use crate::store::{DrawCommit, GiveawayStore, NewParticipant};
        let participant = store
            .insert_participant(NewParticipant {
                name: "Ahmad".into(),
                email: "ahmad@example.com".into(),
                phone: None,
                address: None,
            })
            .await
            .unwrap();
        store
            .commit_draw(DrawCommit {
                prize_id: voucher.id,
                expected_quantity: 1,
                participant_ids: vec![participant.id],
                draw_date: chrono::Utc::now(),
                notes: None,
            })
            .await
            .unwrap();

        let all = service.list_prizes(&PrizeQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        let available = service
            .list_prizes(&PrizeQuery {
                available_only: true,
            })
            .await
            .unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].name, "Headphone");
    }
}
