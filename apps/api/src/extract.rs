//! Request extractors whose rejections use the standard error body.

use axum::extract::{rejection::JsonRejection, FromRequest};
use axum::http::StatusCode;

use crate::errors::AppError;

/// `axum::Json` with rejections mapped onto `AppError`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            AppError::Validation(rejection.body_text())
        }
    }
}
