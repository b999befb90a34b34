//! HTTP error mapping. Input rejections are 4xx with `{ "error": message }`;
//! a response that fails its own validation is a 500.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use pharmyx_common::{InputError, PharmyxError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("Invalid upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Invalid request: {0}")]
    Rejection(#[from] MultipartRejection),

    #[error("Response failed validation: {0}")]
    Contract(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<PharmyxError> for ApiError {
    fn from(err: PharmyxError) -> Self {
        match err {
            PharmyxError::Input(e) => ApiError::Input(e),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Input(_) => StatusCode::BAD_REQUEST,
            ApiError::Multipart(e) => e.status(),
            ApiError::Rejection(e) => e.status(),
            ApiError::Contract(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
