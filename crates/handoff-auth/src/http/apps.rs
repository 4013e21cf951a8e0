//! Dashboard application listing.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::middleware::AuthenticatedPrincipal;
use crate::types::AppDescriptor;

use super::SsoState;

/// One dashboard tile.
#[derive(Debug, Serialize)]
pub struct AppSummary {
    pub key: String,
    pub name: String,
    pub description: Option<String>,
    pub url: String,
    pub icon: Option<String>,
    pub color: Option<String>,
}

impl From<AppDescriptor> for AppSummary {
    fn from(app: AppDescriptor) -> Self {
        Self {
            key: app.key,
            name: app.name,
            description: app.description,
            url: app.callback_url,
            icon: app.icon,
            color: app.color,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AppsResponse {
    pub apps: Vec<AppSummary>,
}

/// `GET /sso/apps` handler. Lists enabled apps in configuration order.
pub async fn apps_handler(
    State(state): State<SsoState>,
    AuthenticatedPrincipal(_principal): AuthenticatedPrincipal,
) -> Json<AppsResponse> {
    let apps = state
        .broker
        .enabled_apps()
        .into_iter()
        .map(AppSummary::from)
        .collect();
    Json(AppsResponse { apps })
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::super::test_support::{read_json, test_app};

    #[tokio::test]
    async fn test_lists_enabled_apps() {
        let app = test_app();
        let (status, body) = read_json(app.send(app.get("/sso/apps", Some(&app.principal))).await).await;

        assert_eq!(status, StatusCode::OK);
        let apps = body["apps"].as_array().unwrap();
        assert_eq!(apps.len(), 2);
        assert_eq!(apps[0]["key"], "cobit");
        assert_eq!(apps[0]["name"], "COBIT Assessment");
        assert_eq!(apps[0]["icon"], "shield-check");
        assert_eq!(apps[0]["url"], "http://cobit.local/sso/callback");
        assert_eq!(apps[1]["key"], "pmo");
        assert!(apps[1]["description"].is_null());
    }

    #[tokio::test]
    async fn test_apps_requires_principal() {
        let app = test_app();
        let response = app.send(app.get("/sso/apps", None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
