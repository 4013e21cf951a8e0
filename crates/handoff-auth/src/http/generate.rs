//! Token generation endpoint.
//!
//! # Request Format
//!
//! ```text
//! POST /sso/generate
//! Content-Type: application/json
//!
//! {"app": "cobit"}
//! ```
//!
//! # Response
//!
//! - `200` `{token, redirect_url, expires_at, status: "success"}`
//! - `404` `{message: "Application unavailable", status: "error"}`
//! - `401` when no principal is attached to the request

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::middleware::{AuthenticatedPrincipal, error_json};
use crate::token::IssueOutcome;

use super::SsoState;

/// Body of a generate request.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    /// Key of the target application.
    #[serde(default)]
    pub app: String,
}

/// Successful generate response.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub token: String,
    pub redirect_url: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    pub status: &'static str,
}

/// `POST /sso/generate` handler.
///
/// An unparseable body is treated as a request for an unknown app.
pub async fn generate_handler(
    State(state): State<SsoState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Response {
    let request = body.map(|Json(req)| req).unwrap_or_default();

    match state.broker.request_handoff(&principal, &request.app).await {
        Ok(IssueOutcome::Issued(issued)) => Json(GenerateResponse {
            token: issued.token,
            redirect_url: issued.redirect_url,
            expires_at: issued.expires_at,
            status: "success",
        })
        .into_response(),
        Ok(IssueOutcome::Unavailable) => (
            StatusCode::NOT_FOUND,
            error_json("Application unavailable"),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(
                error = %e,
                category = %e.category(),
                app = %request.app,
                principal_id = %principal.id,
                "SSO token generation failed"
            );
            e.into_response()
        }
    }
}
