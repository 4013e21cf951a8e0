//! Browser redirect endpoint.
//!
//! `GET /sso/redirect/{app}` (and the `/app/{app}` alias) issues a token and
//! answers with `303 See Other` to the app's callback URL. When the app is
//! unavailable the browser goes back to the portal page with
//! `?error=app_unavailable`.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};

use crate::middleware::AuthenticatedPrincipal;
use crate::token::IssueOutcome;
use crate::types::append_query_param;

use super::SsoState;

/// `GET /sso/redirect/{app}` handler.
pub async fn redirect_handler(
    State(state): State<SsoState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    Path(app): Path<String>,
) -> Response {
    match state.broker.request_handoff(&principal, &app).await {
        Ok(IssueOutcome::Issued(issued)) => Redirect::to(&issued.redirect_url).into_response(),
        Ok(IssueOutcome::Unavailable) => {
            let back = append_query_param(&state.portal_url, "error", "app_unavailable");
            Redirect::to(&back).into_response()
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                category = %e.category(),
                app = %app,
                principal_id = %principal.id,
                "SSO redirect failed"
            );
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{StatusCode, header};

    use super::super::test_support::test_app;
    use crate::storage::SsoTokenStorage;

    #[tokio::test]
    async fn test_redirect_to_app() {
        let app = test_app();
        for uri in ["/sso/redirect/cobit", "/app/cobit"] {
            let response = app.send(app.get(uri, Some(&app.principal))).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER);

            let location = response.headers()[header::LOCATION].to_str().unwrap();
            let token = location
                .strip_prefix("http://cobit.local/sso/callback?token=")
                .unwrap();
            assert!(app.storage.find_by_token(token).await.unwrap().is_some());
        }
    }

    #[tokio::test]
    async fn test_redirect_unavailable_goes_back_to_portal() {
        let app = test_app();
        let response = app
            .send(app.get("/sso/redirect/hr", Some(&app.principal)))
            .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/dashboard?error=app_unavailable"
        );
        assert_eq!(app.storage.token_count(), 0);
    }

    #[tokio::test]
    async fn test_redirect_requires_principal() {
        let app = test_app();
        let response = app.send(app.get("/app/cobit", None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
