use actix_web::{App, HttpServer, error::JsonPayloadError, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::sync::Arc;

use giveaway_backend::{
    AppError,
    config::Config,
    database::{create_pool, run_migrations},
    handlers,
    middlewares::create_cors,
    services::*,
    store::{DatabaseStore, MemoryStore, SharedStore},
    swagger::swagger_config,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration file");

    // 选择存储: 配置了数据库则使用 sea-orm, 否则使用内存存储
    let store: SharedStore = match &config.database {
        Some(db_config) => {
            let pool = create_pool(db_config)
                .await
                .expect("Failed to create database connection pool");
            run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            Arc::new(DatabaseStore::new(pool))
        }
        None => {
            log::warn!("No database configured, using in-memory store (data is not persisted)");
            Arc::new(MemoryStore::new())
        }
    };

    // 创建服务
    let prize_service = PrizeService::new(store.clone());
    let participant_service = ParticipantService::new(store.clone());
    let draw_service = DrawService::new(store.clone(), config.draw.clone());
    let winner_service = WinnerService::new(store);

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .app_data(web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req| {
                AppError::InvalidArgument(err.to_string()).into()
            }))
            .app_data(web::Data::new(prize_service.clone()))
            .app_data(web::Data::new(participant_service.clone()))
            .app_data(web::Data::new(draw_service.clone()))
            .app_data(web::Data::new(winner_service.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::prize_config)
                    .configure(handlers::participant_config)
                    .configure(handlers::draw_config)
                    .configure(handlers::winner_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
