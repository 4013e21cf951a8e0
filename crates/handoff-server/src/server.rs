use std::{net::SocketAddr, sync::Arc};

use axum::{Router, http::HeaderName, middleware, routing::get};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use handoff_auth::storage::{InMemoryStorage, PrincipalStorage, SsoTokenStorage};
use handoff_auth::{ConfigAppRegistry, SsoBroker, SsoState, redemption_routes, session_routes};
use handoff_auth_postgres::{PostgresSsoStorage, create_pool, mask_password};

use crate::config::{AppConfig, StorageBackend};
use crate::middleware::PrincipalResolver;
use crate::{handlers, middleware as app_middleware, observability};

/// Everything the routes and the reload task share.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub registry: Arc<ConfigAppRegistry>,
    pub broker: Arc<SsoBroker>,
    pub principals: Arc<dyn PrincipalStorage>,
}

/// Connects the configured store, seeds principals and wires the broker.
pub async fn build_state(cfg: &AppConfig) -> anyhow::Result<AppState> {
    let (tokens, principals): (Arc<dyn SsoTokenStorage>, Arc<dyn PrincipalStorage>) =
        match cfg.storage.backend {
            StorageBackend::Memory => {
                let storage = Arc::new(InMemoryStorage::new());
                for seed in &cfg.auth.principals {
                    storage.upsert_principal(seed.to_principal());
                }
                tracing::warn!("Using in-memory token store; tokens do not survive a restart");
                (
                    storage.clone() as Arc<dyn SsoTokenStorage>,
                    storage as Arc<dyn PrincipalStorage>,
                )
            }
            StorageBackend::Postgres => {
                let pg = &cfg.storage.postgres;
                let url = pg.connection_url();
                let pool = create_pool(&url, pg.pool_size, pg.connect_timeout())
                    .await
                    .map_err(|e| {
                        anyhow::anyhow!("failed to connect to {}: {e}", mask_password(&url))
                    })?;
                let storage = PostgresSsoStorage::new(Arc::new(pool));
                if pg.run_migrations {
                    storage.migrate().await?;
                    tracing::info!("Database migrations applied");
                }
                let principal_store = storage.principal_store();
                for seed in &cfg.auth.principals {
                    principal_store.upsert(&seed.to_principal()).await?;
                }
                (
                    Arc::new(storage.token_store()) as Arc<dyn SsoTokenStorage>,
                    Arc::new(principal_store) as Arc<dyn PrincipalStorage>,
                )
            }
        };

    if !cfg.auth.principals.is_empty() {
        tracing::info!(count = cfg.auth.principals.len(), "Principals seeded");
    }

    let registry = Arc::new(ConfigAppRegistry::from_config(&cfg.sso));
    let broker = Arc::new(SsoBroker::new(registry.clone(), tokens, &cfg.sso));

    tracing::info!(
        backend = %cfg.storage.backend,
        apps = registry.len(),
        enabled = broker.enabled_apps().len(),
        token_ttl_minutes = cfg.sso.token_ttl_minutes,
        "SSO broker initialized"
    );

    Ok(AppState {
        config: Arc::new(cfg.clone()),
        registry,
        broker,
        principals,
    })
}

pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let cfg = &state.config;
    let header = HeaderName::try_from(cfg.auth.principal_header.as_str())?;
    let resolver = PrincipalResolver {
        header,
        store: state.principals.clone(),
        timeout: cfg.sso.store_timeout,
    };

    // Principal resolution only wraps routes that need a portal session.
    let sso = session_routes()
        .layer(middleware::from_fn_with_state(
            resolver,
            app_middleware::resolve_principal,
        ))
        .merge(redemption_routes())
        .with_state(SsoState::new(
            state.broker.clone(),
            cfg.sso.portal_url.as_str(),
        ));

    // Outermost first: request id -> trace -> cors -> body limit
    let layers = ServiceBuilder::new()
        .layer(middleware::from_fn(app_middleware::request_id))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .extensions()
                        .get::<axum::http::HeaderValue>()
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri().path(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(CorsLayer::permissive())
        .layer(axum::extract::DefaultBodyLimit::max(
            cfg.server.body_limit_bytes,
        ));

    Ok(Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .merge(sso)
        .layer(layers))
}

pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let state = build_state(cfg).await?;
    build_router(&state)
}

pub struct HandoffServer {
    addr: SocketAddr,
    app: Router,
    state: AppState,
    config_path: Option<String>,
}

#[derive(Default)]
pub struct ServerBuilder {
    addr: Option<SocketAddr>,
    config: AppConfig,
    config_path: Option<String>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = Some(addr);
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.config = cfg;
        self
    }

    /// File re-read on SIGHUP to refresh the app table and log level.
    pub fn with_config_path(mut self, path: impl Into<String>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub async fn build(self) -> anyhow::Result<HandoffServer> {
        let state = build_state(&self.config).await?;
        let app = build_router(&state)?;

        Ok(HandoffServer {
            addr: self.addr.unwrap_or_else(|| self.config.addr()),
            app,
            state,
            config_path: self.config_path,
        })
    }
}

impl HandoffServer {
    pub async fn run(self) -> anyhow::Result<()> {
        spawn_reload_listener(self.state.clone(), self.config_path.clone());

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Re-reads the configuration and swaps in the new app table and log level.
///
/// Token lifetime, storage and listener settings need a restart.
pub fn reload(state: &AppState, config_path: Option<&str>) -> anyhow::Result<()> {
    let cfg = crate::config::loader::load_config(config_path).map_err(anyhow::Error::msg)?;

    state.registry.replace(cfg.sso.app_descriptors());
    observability::apply_logging_level(&cfg.logging.level);

    if cfg.sso.token_ttl_minutes != state.config.sso.token_ttl_minutes
        || cfg.storage.backend != state.config.storage.backend
        || cfg.addr() != state.config.addr()
    {
        tracing::warn!("Token TTL, storage and listener changes take effect after a restart");
    }
    Ok(())
}

#[cfg(unix)]
fn spawn_reload_listener(state: AppState, config_path: Option<String>) {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "SIGHUP handler unavailable; config reload disabled");
            return;
        }
    };

    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            match reload(&state, config_path.as_deref()) {
                Ok(()) => tracing::info!("Configuration reloaded"),
                Err(e) => tracing::error!(error = %e, "Configuration reload failed; keeping previous"),
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_reload_listener(_state: AppState, _config_path: Option<String>) {}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use handoff_auth::AppRegistry;
    use handoff_auth::config::AppEntry;

    fn entry(url: &str, enabled: bool) -> AppEntry {
        AppEntry {
            name: "App".into(),
            description: None,
            url: url.into(),
            icon: None,
            color: None,
            enabled,
        }
    }

    #[tokio::test]
    async fn test_build_state_memory_backend() {
        let mut cfg = AppConfig::default();
        cfg.sso
            .apps
            .insert("cobit".into(), entry("http://cobit.local", true));
        cfg.sso
            .apps
            .insert("hr".into(), entry("http://hr.local", false));

        let state = build_state(&cfg).await.unwrap();
        assert_eq!(state.registry.len(), 2);
        assert_eq!(state.broker.enabled_apps().len(), 1);
        assert!(build_router(&state).is_ok());
    }

    struct UnreachablePrincipals;

    #[async_trait::async_trait]
    impl PrincipalStorage for UnreachablePrincipals {
        async fn find_by_id(
            &self,
            _id: uuid::Uuid,
        ) -> handoff_auth::HandoffResult<Option<handoff_auth::Principal>> {
            Err(handoff_auth::HandoffError::storage("connection refused"))
        }
    }

    #[tokio::test]
    async fn test_principal_lookup_only_guards_session_routes() {
        use axum::body::Body;
        use axum::http::{Request, StatusCode};
        use tower::ServiceExt;

        let mut cfg = AppConfig::default();
        cfg.sso
            .apps
            .insert("cobit".into(), entry("http://cobit.local", true));
        let mut state = build_state(&cfg).await.unwrap();
        state.principals = Arc::new(UnreachablePrincipals);
        let router = build_router(&state).unwrap();

        let post = |uri: &str, body: &str| {
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .header("x-portal-principal", uuid::Uuid::new_v4().to_string())
                .body(Body::from(body.to_string()))
                .unwrap()
        };

        // Redemption ignores the session header entirely.
        let res = router
            .clone()
            .oneshot(post("/sso/validate", &format!(r#"{{"token":"{}"}}"#, "0".repeat(64))))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = router
            .oneshot(post("/sso/generate", r#"{"app":"cobit"}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_reload_replaces_app_table() {
        let state = build_state(&AppConfig::default()).await.unwrap();
        assert!(state.registry.is_empty());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("handoff.toml");
        std::fs::write(
            &path,
            r#"
[sso.apps.pmo]
name = "PMO"
url = "http://pmo.local/sso/callback"
enabled = true
"#,
        )
        .unwrap();

        reload(&state, path.to_str()).unwrap();
        assert_eq!(state.registry.len(), 1);
        assert!(state.broker.registry().is_enabled("pmo"));
    }
}
