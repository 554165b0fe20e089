use actix_cors::Cors;

pub fn create_cors() -> Cors {
    Cors::default()
        // 管理后台与前端可能部署在不同域名
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
        .allow_any_header()
        .max_age(3600)
}
