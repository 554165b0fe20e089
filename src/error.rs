use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Insufficient prize quantity: requested {requested}, available {available}")]
    InsufficientInventory { requested: i32, available: i32 },

    #[error("Not enough eligible participants: requested {requested}, eligible {eligible}")]
    InsufficientParticipants { requested: i32, eligible: usize },

    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Config error: {0}")]
    ConfigError(String),
}

impl AppError {
    /// 稳定的错误码, 供调用方 (前端) 显示
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidArgument(_) => "INVALID_ARGUMENT",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::InsufficientInventory { .. } => "INSUFFICIENT_INVENTORY",
            AppError::InsufficientParticipants { .. } => "INSUFFICIENT_PARTICIPANTS",
            AppError::PersistenceError(_) => "PERSISTENCE_ERROR",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::ConfigError(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(e) => AppError::DatabaseError(e),
            StoreError::Duplicate(msg) => AppError::Conflict(msg),
            // 正常情况下由抽奖服务重试, 走到这里说明重试已耗尽
            StoreError::StaleDraw => {
                AppError::PersistenceError("Draw state changed during commit".into())
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidArgument(_) | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_)
            | AppError::InsufficientInventory { .. }
            | AppError::InsufficientParticipants { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::InvalidArgument(msg) | AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                msg.clone()
            }
            AppError::NotFound(msg) | AppError::Conflict(msg) => msg.clone(),
            AppError::InsufficientInventory { .. } | AppError::InsufficientParticipants { .. } => {
                log::info!("Draw rejected: {self}");
                self.to_string()
            }
            AppError::PersistenceError(msg) => {
                log::error!("Persistence error: {msg}");
                "Draw could not be saved, nothing was changed".to_string()
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                "Database error".to_string()
            }
            _ => {
                log::error!("Internal error: {self}");
                "Internal server error".to_string()
            }
        };

        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": {
                "code": self.code(),
                "message": message
            }
        }))
    }
}
