use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ApiResponse;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest(message) => {
                tracing::warn!("⚠️ Rejected report request: {}", message);
                let body = ApiResponse::<()>::failure(message.clone(), message);
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            AppError::Internal(e) => {
                tracing::error!("❌ Report failed: {:?}", e);
                let body = ApiResponse::<()>::failure(
                    "Failed to generate report",
                    "Internal server error",
                );
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}
