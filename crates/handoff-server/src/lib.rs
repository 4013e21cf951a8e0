pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod server;

pub use config::AppConfig;
pub use observability::{apply_logging_level, init_tracing, init_tracing_with_level};
pub use server::{AppState, HandoffServer, ServerBuilder, build_app, build_router, build_state};
