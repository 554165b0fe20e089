use crate::error::{AppError, AppResult};
use crate::models::{
    CreateParticipantRequest, PaginationParams, ParticipantPageResponse, ParticipantQuery,
    ParticipantResponse,
};
use crate::store::{NewParticipant, SharedStore};
use crate::utils::{
    NAME_MAX_LEN, TEXT_MAX_LEN, sanitize_optional, sanitize_text, validate_email,
    validate_max_len, validate_phone, validate_required,
};

#[derive(Clone)]
pub struct ParticipantService {
    store: SharedStore,
}

impl ParticipantService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// 新建参与者（邮箱大小写不敏感唯一）
    pub async fn create_participant(
        &self,
        request: CreateParticipantRequest,
    ) -> AppResult<ParticipantResponse> {
        let name = sanitize_text(&request.name);
        validate_required("Participant name", &name, NAME_MAX_LEN)?;

        let email = request.email.trim().to_string();
        validate_email(&email)?;

        let phone = sanitize_optional(request.phone.as_deref());
        if let Some(phone) = &phone {
            validate_phone(phone)?;
        }

        let address = sanitize_optional(request.address.as_deref());
        if let Some(address) = &address {
            validate_max_len("Address", address, TEXT_MAX_LEN)?;
        }

        let participant = self
            .store
            .insert_participant(NewParticipant {
                name,
                email,
                phone,
                address,
            })
            .await?;

        log::info!("Participant registered: id={}", participant.id);
        Ok(participant.into())
    }

    /// 参与者列表（按注册顺序分页）
    pub async fn list_participants(
        &self,
        query: &ParticipantQuery,
    ) -> AppResult<ParticipantPageResponse> {
        let params = PaginationParams::new(query.page, query.per_page);
        let total = self.store.count_participants().await?;
        let list: Vec<ParticipantResponse> = self
            .store
            .list_participants_page(params.get_offset(), params.get_limit())
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        Ok(params.to_response(list, total))
    }

    pub async fn get_participant(&self, id: i64) -> AppResult<ParticipantResponse> {
        self.store
            .get_participant(id)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::NotFound(format!("Participant {id} not found")))
    }

    /// 删除参与者，同时删除其全部中奖记录
    pub async fn delete_participant(&self, id: i64) -> AppResult<()> {
        if !self.store.delete_participant(id).await? {
            return Err(AppError::NotFound(format!("Participant {id} not found")));
        }
        log::info!("Participant deleted: id={id}");
        Ok(())
    }
}
