use crate::models::*;
use crate::services::WinnerService;
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/winners",
    tag = "winner",
    params(
        ("page" = Option<u32>, Query, description = "页码 (默认1)"),
        ("per_page" = Option<u32>, Query, description = "每页数量 (默认20)"),
        ("prize_id" = Option<i64>, Query, description = "按奖品过滤")
    ),
    responses(
        (status = 200, description = "获取中奖历史成功", body = WinnerPageResponse)
    )
)]
/// 中奖历史（倒序）
pub async fn list_winners(
    service: web::Data<WinnerService>,
    query: web::Query<WinnerQuery>,
) -> Result<HttpResponse> {
    match service.list_winners(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "winner",
    responses(
        (status = 200, description = "首页统计", body = DashboardResponse)
    )
)]
pub async fn dashboard(service: web::Data<WinnerService>) -> Result<HttpResponse> {
    match service.dashboard().await {
        Ok(stats) => Ok(HttpResponse::Ok().json(ApiResponse::success(stats))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn winner_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/winners", web::get().to(list_winners))
        .route("/dashboard", web::get().to(dashboard));
}
