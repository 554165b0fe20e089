use crate::models::*;
use crate::services::DrawService;
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/draws/{prize_id}/eligible",
    tag = "draw",
    params(("prize_id" = i64, Path, description = "奖品ID")),
    responses(
        (status = 200, description = "尚未获得该奖品的参与者", body = [ParticipantResponse]),
        (status = 404, description = "奖品不存在")
    )
)]
pub async fn get_eligible(
    service: web::Data<DrawService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match service.list_eligible(path.into_inner()).await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/draws/{prize_id}/options",
    tag = "draw",
    params(("prize_id" = i64, Path, description = "奖品ID")),
    responses(
        (status = 200, description = "当前最多可抽人数", body = DrawOptionsResponse),
        (status = 404, description = "奖品不存在")
    )
)]
pub async fn get_options(
    service: web::Data<DrawService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match service.draw_options(path.into_inner()).await {
        Ok(options) => Ok(HttpResponse::Ok().json(ApiResponse::success(options))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/draws",
    tag = "draw",
    request_body = DrawRequest,
    responses(
        (status = 200, description = "抽奖成功", body = DrawResponse),
        (status = 400, description = "中奖人数非法"),
        (status = 404, description = "奖品不存在"),
        (status = 409, description = "奖品数量或可参与人数不足"),
        (status = 500, description = "保存失败, 未做任何修改")
    )
)]
/// 进行一次抽奖:
/// 1. 校验中奖人数、奖品剩余数量、可参与人数
/// 2. 从未获得该奖品的参与者中等概率抽取
/// 3. 写入中奖记录并扣减数量（原子提交）
pub async fn draw(
    service: web::Data<DrawService>,
    request: web::Json<DrawRequest>,
) -> Result<HttpResponse> {
    match service.draw(request.into_inner()).await {
        Ok(result) => Ok(HttpResponse::Ok().json(ApiResponse::success(result))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn draw_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/draws")
            .route("", web::post().to(draw))
            .route("/{prize_id}/eligible", web::get().to(get_eligible))
            .route("/{prize_id}/options", web::get().to(get_options)),
    );
}
