use crate::models::*;
use crate::services::ParticipantService;
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/participants",
    tag = "participant",
    params(
        ("page" = Option<u32>, Query, description = "页码 (默认1)"),
        ("per_page" = Option<u32>, Query, description = "每页数量 (默认20)")
    ),
    responses(
        (status = 200, description = "获取参与者列表成功", body = ParticipantPageResponse)
    )
)]
pub async fn list_participants(
    service: web::Data<ParticipantService>,
    query: web::Query<ParticipantQuery>,
) -> Result<HttpResponse> {
    match service.list_participants(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/participants",
    tag = "participant",
    request_body = CreateParticipantRequest,
    responses(
        (status = 201, description = "参与者登记成功", body = ParticipantResponse),
        (status = 400, description = "参数校验失败"),
        (status = 409, description = "邮箱已存在")
    )
)]
pub async fn create_participant(
    service: web::Data<ParticipantService>,
    request: web::Json<CreateParticipantRequest>,
) -> Result<HttpResponse> {
    match service.create_participant(request.into_inner()).await {
        Ok(participant) => Ok(HttpResponse::Created().json(ApiResponse::success(participant))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/participants/{id}",
    tag = "participant",
    params(("id" = i64, Path, description = "参与者ID")),
    responses(
        (status = 200, description = "获取参与者成功", body = ParticipantResponse),
        (status = 404, description = "参与者不存在")
    )
)]
pub async fn get_participant(
    service: web::Data<ParticipantService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match service.get_participant(path.into_inner()).await {
        Ok(participant) => Ok(HttpResponse::Ok().json(ApiResponse::success(participant))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/participants/{id}",
    tag = "participant",
    params(("id" = i64, Path, description = "参与者ID")),
    responses(
        (status = 200, description = "参与者及其中奖记录已删除"),
        (status = 404, description = "参与者不存在")
    )
)]
/// 删除参与者（级联删除其中奖记录）
pub async fn delete_participant(
    service: web::Data<ParticipantService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    match service.delete_participant(id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            id,
            "Participant deleted".to_string(),
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn participant_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/participants")
            .route("", web::get().to(list_participants))
            .route("", web::post().to(create_participant))
            .route("/{id}", web::get().to(get_participant))
            .route("/{id}", web::delete().to(delete_participant)),
    );
}
