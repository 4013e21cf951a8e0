//! Principal extractor.
//!
//! The broker does not authenticate browsers itself. A session layer in
//! front of it resolves the portal session and inserts the active
//! [`Principal`] into the request extensions; this extractor only reads it.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};

use crate::types::Principal;

use super::error::error_json;

/// Axum extractor for the authenticated portal principal.
///
/// Rejects with `401 {"message": "Unauthenticated", "status": "error"}`
/// when no principal was attached to the request.
#[derive(Debug, Clone)]
pub struct AuthenticatedPrincipal(pub Principal);

impl<S> FromRequestParts<S> for AuthenticatedPrincipal
where
    S: Send + Sync,
{
    type Rejection = Unauthenticated;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(Self)
            .ok_or(Unauthenticated)
    }
}

/// Rejection for requests without an authenticated principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unauthenticated;

impl IntoResponse for Unauthenticated {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, error_json("Unauthenticated")).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    #[tokio::test]
    async fn test_extracts_attached_principal() {
        let principal = Principal::new("fb-1", "Ayu", "ayu@example.com", "user");
        let (mut parts, _) = Request::builder()
            .uri("/sso/apps")
            .extension(principal.clone())
            .body(())
            .unwrap()
            .into_parts();

        let AuthenticatedPrincipal(found) =
            <AuthenticatedPrincipal as FromRequestParts<()>>::from_request_parts(&mut parts, &())
                .await
                .unwrap();
        assert_eq!(found.id, principal.id);
    }

    #[tokio::test]
    async fn test_rejects_missing_principal() {
        let (mut parts, _) = Request::builder()
            .uri("/sso/apps")
            .body(())
            .unwrap()
            .into_parts();

        let rejection =
            <AuthenticatedPrincipal as FromRequestParts<()>>::from_request_parts(&mut parts, &())
                .await
                .unwrap_err();
        assert_eq!(rejection.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}
