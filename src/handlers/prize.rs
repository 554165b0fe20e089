use crate::models::*;
use crate::services::PrizeService;
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/prizes",
    tag = "prize",
    params(
        ("available_only" = Option<bool>, Query, description = "仅返回仍有数量的奖品")
    ),
    responses(
        (status = 200, description = "获取奖品列表成功", body = [PrizeResponse])
    )
)]
/// 奖品列表（按名称排序）
pub async fn list_prizes(
    service: web::Data<PrizeService>,
    query: web::Query<PrizeQuery>,
) -> Result<HttpResponse> {
    match service.list_prizes(&query).await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/prizes",
    tag = "prize",
    request_body = CreatePrizeRequest,
    responses(
        (status = 201, description = "奖品创建成功", body = PrizeResponse),
        (status = 400, description = "参数校验失败"),
        (status = 409, description = "奖品名称已存在")
    )
)]
pub async fn create_prize(
    service: web::Data<PrizeService>,
    request: web::Json<CreatePrizeRequest>,
) -> Result<HttpResponse> {
    match service.create_prize(request.into_inner()).await {
        Ok(prize) => Ok(HttpResponse::Created().json(ApiResponse::success(prize))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/prizes/{id}",
    tag = "prize",
    params(("id" = i64, Path, description = "奖品ID")),
    responses(
        (status = 200, description = "获取奖品成功", body = PrizeResponse),
        (status = 404, description = "奖品不存在")
    )
)]
pub async fn get_prize(
    service: web::Data<PrizeService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match service.get_prize(path.into_inner()).await {
        Ok(prize) => Ok(HttpResponse::Ok().json(ApiResponse::success(prize))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/prizes/{id}",
    tag = "prize",
    params(("id" = i64, Path, description = "奖品ID")),
    responses(
        (status = 200, description = "奖品及其中奖记录已删除"),
        (status = 404, description = "奖品不存在")
    )
)]
/// 删除奖品（级联删除其中奖记录）
pub async fn delete_prize(
    service: web::Data<PrizeService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    match service.delete_prize(id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            id,
            "Prize deleted".to_string(),
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn prize_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/prizes")
            .route("", web::get().to(list_prizes))
            .route("", web::post().to(create_prize))
            .route("/{id}", web::get().to(get_prize))
            .route("/{id}", web::delete().to(delete_prize)),
    );
}
