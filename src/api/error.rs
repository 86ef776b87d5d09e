//! Error bodies returned by the API
//!
//! Every error is `{"error_id", "error_message", "error_name"}`, the shape
//! the Stack Exchange API uses.

use crate::{ScrapeError, ValidationError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

/// JSON error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
    pub error_id: u16,
    pub error_message: String,
    pub error_name: String,
}

impl ApiError {
    /// 400; `message` names the offending parameter
    pub fn bad_parameter(message: impl Into<String>) -> Self {
        Self {
            error_id: 400,
            error_message: message.into(),
            error_name: "bad_parameter".to_string(),
        }
    }

    /// 404 for unknown routes and malformed ids
    pub fn no_method() -> Self {
        Self {
            error_id: 404,
            error_message: "no method found with this name".to_string(),
            error_name: "no_method".to_string(),
        }
    }

    /// 500 when the page a request depends on cannot be scraped
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self {
            error_id: 500,
            error_message: message.into(),
            error_name: "internal_error".to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.error_id).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::BadParameter(message) => ApiError::bad_parameter(message),
            ValidationError::NotFound => ApiError::no_method(),
        }
    }
}

impl From<ScrapeError> for ApiError {
    fn from(err: ScrapeError) -> Self {
        tracing::error!("Request failed: {}", err);
        ApiError::internal_error(err.to_string())
    }
}
