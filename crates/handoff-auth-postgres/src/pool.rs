//! Connection pool management.

use std::time::Duration;

use sqlx_core::pool::PoolOptions;
use sqlx_postgres::Postgres;
use tracing::{debug, info, instrument};

use crate::{PgPool, StorageResult};

/// Type alias for PostgreSQL pool options.
pub type PgPoolOptions = PoolOptions<Postgres>;

/// Creates a new PostgreSQL connection pool.
///
/// # Errors
///
/// Returns an error if no connection can be established within
/// `acquire_timeout`.
#[instrument(skip(url), fields(url = %mask_password(url)))]
pub async fn create_pool(
    url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> StorageResult<PgPool> {
    info!(
        max_connections,
        acquire_timeout_ms = acquire_timeout.as_millis() as u64,
        "Creating PostgreSQL connection pool"
    );

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(acquire_timeout)
        .max_lifetime(Duration::from_secs(1800))
        .connect(url)
        .await?;

    debug!("PostgreSQL connection pool created successfully");

    Ok(pool)
}

/// Masks the password in a database URL for logging.
#[must_use]
pub fn mask_password(url: &str) -> String {
    if let Some(at_pos) = url.rfind('@')
        && let Some(colon_pos) = url[..at_pos].rfind(':')
    {
        let scheme_end = url.find("://").map(|p| p + 3).unwrap_or(0);
        if colon_pos > scheme_end {
            return format!("{}:****{}", &url[..colon_pos], &url[at_pos..]);
        }
    }
    url.to_string()
}
