//! Error response handling.
//!
//! All broker error bodies share one shape:
//! `{"message": "...", "status": "error"}`. Infrastructure failures never
//! expose store error text.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use crate::error::HandoffError;

/// Message returned for every infrastructure failure.
pub const UNAVAILABLE_MESSAGE: &str = "Service temporarily unavailable";

/// Builds the standard error body.
#[must_use]
pub fn error_json(message: &str) -> Json<Value> {
    Json(json!({
        "message": message,
        "status": "error",
    }))
}

impl IntoResponse for HandoffError {
    fn into_response(self) -> Response {
        let status = if self.is_server_error() {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        (status, error_json(UNAVAILABLE_MESSAGE)).into_response()
    }
}
