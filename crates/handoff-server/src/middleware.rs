use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use handoff_auth::storage::{PrincipalStorage, with_timeout};

pub async fn request_id(mut req: Request<Body>, next: Next) -> Response {
    let header_name = HeaderName::from_static("x-request-id");

    // If the incoming request already has a request-id, preserve it; otherwise generate one
    let req_id_value = match req.headers().get(&header_name) {
        Some(value) => value.clone(),
        None => generated_request_id(),
    };

    // Add to request extensions for downstream usage (e.g., logging)
    req.extensions_mut().insert(req_id_value.clone());

    let mut res = next.run(req).await;

    // Add/propagate the request id header to response
    res.headers_mut().insert(header_name, req_id_value);

    res
}

fn generated_request_id() -> HeaderValue {
    // A hyphenated UUID is always a valid header value.
    HeaderValue::from_str(&Uuid::new_v4().to_string())
        .unwrap_or_else(|_| HeaderValue::from_static("unknown"))
}

// =============================================================================
// Portal Principal Resolution
// =============================================================================

/// State for [`resolve_principal`].
#[derive(Clone)]
pub struct PrincipalResolver {
    pub header: HeaderName,
    pub store: Arc<dyn PrincipalStorage>,
    pub timeout: Duration,
}

/// Attaches the portal session's principal to the request.
///
/// The session layer in front of the broker forwards the principal id in
/// the configured header. Only active, non-deleted principals are attached;
/// anything else leaves the request unauthenticated and the SSO handlers
/// answer 401. A failing principal store answers 503.
pub async fn resolve_principal(
    State(resolver): State<PrincipalResolver>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(id) = req
        .headers()
        .get(&resolver.header)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
    else {
        return next.run(req).await;
    };

    let lookup = with_timeout(
        resolver.timeout,
        "principal lookup",
        resolver.store.find_by_id(id),
    )
    .await;

    match lookup {
        Ok(Some(principal)) if principal.is_active() => {
            req.extensions_mut().insert(principal);
        }
        Ok(Some(_)) => {
            tracing::debug!(principal_id = %id, "Ignoring inactive principal");
        }
        Ok(None) => {
            tracing::debug!(principal_id = %id, "Unknown principal");
        }
        Err(e) => {
            tracing::warn!(error = %e, principal_id = %id, "Principal lookup failed");
            return e.into_response();
        }
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Extension, Router, http::StatusCode, middleware, routing::get};
    use handoff_auth::storage::InMemoryStorage;
    use handoff_auth::types::{Principal, PrincipalStatus};
    use tower::ServiceExt;

    async fn whoami(principal: Option<Extension<Principal>>) -> String {
        principal
            .map(|Extension(p)| p.name)
            .unwrap_or_else(|| "anonymous".to_string())
    }

    fn app(storage: Arc<InMemoryStorage>) -> Router {
        let resolver = PrincipalResolver {
            header: HeaderName::from_static("x-portal-principal"),
            store: storage,
            timeout: Duration::from_secs(1),
        };
        Router::new()
            .route("/whoami", get(whoami))
            .layer(middleware::from_fn_with_state(resolver, resolve_principal))
            .layer(middleware::from_fn(request_id))
    }

    async fn call(router: Router, principal: Option<&str>) -> (StatusCode, String) {
        let mut builder = Request::builder().uri("/whoami");
        if let Some(id) = principal {
            builder = builder.header("x-portal-principal", id);
        }
        let res = router
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(res.headers().contains_key("x-request-id"));
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_active_principal_is_attached() {
        let storage = Arc::new(InMemoryStorage::new());
        let principal = Principal::new("fb-1", "Ayu", "ayu@example.com", "user");
        storage.upsert_principal(principal.clone());

        let (status, body) = call(app(storage), Some(&principal.id.to_string())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Ayu");
    }

    #[tokio::test]
    async fn test_inactive_principal_is_ignored() {
        let storage = Arc::new(InMemoryStorage::new());
        let mut principal = Principal::new("fb-2", "Budi", "budi@example.com", "user");
        principal.status = PrincipalStatus::Suspended;
        storage.upsert_principal(principal.clone());

        let (_, body) = call(app(storage), Some(&principal.id.to_string())).await;
        assert_eq!(body, "anonymous");
    }

    #[tokio::test]
    async fn test_missing_or_malformed_header() {
        let storage = Arc::new(InMemoryStorage::new());
        assert_eq!(call(app(storage.clone()), None).await.1, "anonymous");
        assert_eq!(call(app(storage), Some("not-a-uuid")).await.1, "anonymous");
    }

    #[tokio::test]
    async fn test_request_id_is_preserved() {
        let router = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(middleware::from_fn(request_id));
        let res = router
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.headers()["x-request-id"], "abc-123");
    }
}
