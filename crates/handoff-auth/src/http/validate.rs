//! Token validation endpoint, called server-to-server by downstream apps.
//!
//! Every rejection (unknown, malformed, used, expired, inactive principal,
//! missing field, unparseable body) produces the same 401 body so that
//! callers cannot probe token state.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::middleware::error_json;
use crate::token::RedeemOutcome;
use crate::types::PrincipalView;

use super::SsoState;

const INVALID_TOKEN_MESSAGE: &str = "Invalid or expired token";

/// Body of a validate request.
#[derive(Debug, Default, Deserialize)]
pub struct ValidateRequest {
    #[serde(default)]
    pub token: String,
}

/// Successful validate response.
#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub user: PrincipalView,
    pub status: &'static str,
}

/// `POST /sso/validate` handler.
pub async fn validate_handler(
    State(state): State<SsoState>,
    body: Result<Json<ValidateRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(request)) = body else {
        return invalid_token();
    };

    match state.broker.complete_handoff(&request.token).await {
        Ok(RedeemOutcome::Redeemed(user)) => Json(ValidateResponse {
            user,
            status: "success",
        })
        .into_response(),
        Ok(RedeemOutcome::Invalid) => invalid_token(),
        Err(e) => {
            tracing::error!(
                error = %e,
                category = %e.category(),
                "SSO token validation failed"
            );
            e.into_response()
        }
    }
}

fn invalid_token() -> Response {
    (StatusCode::UNAUTHORIZED, error_json(INVALID_TOKEN_MESSAGE)).into_response()
}
