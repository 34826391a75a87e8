use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unknown pump id: {0}")]
    InvalidTarget(i64),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("MQTT transport error: {0}")]
    Transport(String),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InvalidTarget(id) => {
                (StatusCode::BAD_REQUEST, format!("unknown pump id: {}", id))
            }
            AppError::InvalidValue(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Decode(ref e) => (StatusCode::BAD_REQUEST, e.to_string()),
            AppError::Transport(ref e) => {
                tracing::error!("transport error: {}", e);
                (StatusCode::BAD_GATEWAY, "transport error".to_string())
            }
            AppError::Db(ref e) => {
                tracing::error!("database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "database error".to_string())
            }
            AppError::Config(ref msg) => {
                tracing::error!("config error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
            AppError::Other(ref e) => {
                tracing::error!("internal error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
