//! Builders for the `(StatusCode, Json<ErrorResponse>)` rejections returned by
//! handlers.

use axum::{http::StatusCode, response::Json};
use compute::ComputeError;
use sea_orm::DbErr;
use tracing::error;

use crate::schemas::ErrorResponse;

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            code: code.to_string(),
            success: false,
        }),
    )
}

pub fn validation_error(message: impl Into<String>) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
}

pub fn not_found(entity: &str, id: i32) -> ApiError {
    api_error(
        StatusCode::NOT_FOUND,
        "NOT_FOUND",
        format!("{} with id {} not found", entity, id),
    )
}

pub fn conflict(message: impl Into<String>) -> ApiError {
    api_error(StatusCode::CONFLICT, "CONFLICT", message)
}

/// Logs the database failure and hides its details from the caller.
pub fn database_error(context: &str, err: DbErr) -> ApiError {
    error!("{}: {}", context, err);
    api_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "DATABASE_ERROR",
        context.to_string(),
    )
}

pub fn compute_error(err: ComputeError) -> ApiError {
    validation_error(err.to_string())
}
