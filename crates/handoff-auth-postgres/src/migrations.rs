//! Embedded schema migrations.
//!
//! Migrations are compiled into the binary with `include_str!` and applied
//! through `sqlx_core::migrate::Migrator`, which records them in
//! `_sqlx_migrations`.
//!
//! To add a new migration:
//! 1. Create the SQL file in `migrations/`
//! 2. Add an entry to the `embedded_migrations!()` macro below

use std::borrow::Cow;

use sqlx_core::migrate::{Migration, MigrationType, Migrator};
use tracing::{info, instrument};

use crate::{PgPool, StorageError, StorageResult};

/// Each entry is `(version, description, sql)`, in chronological order.
macro_rules! embedded_migrations {
    () => {
        &[(
            20260301000001i64,
            "sso_schema",
            include_str!("../migrations/20260301000001_sso_schema.sql"),
        )]
    };
}

fn build_migrations() -> Vec<Migration> {
    embedded_migrations!()
        .iter()
        .map(|(version, description, sql)| Migration {
            version: *version,
            description: Cow::Borrowed(description),
            migration_type: MigrationType::Simple,
            sql: Cow::Borrowed(sql),
            checksum: Cow::Borrowed(&[]),
            no_tx: false,
        })
        .collect()
}

/// Runs all pending migrations.
///
/// # Errors
///
/// Returns [`StorageError::Migration`] if a migration fails to apply.
#[instrument(skip(pool))]
pub async fn run(pool: &PgPool) -> StorageResult<()> {
    let migrations = build_migrations();
    info!(count = migrations.len(), "Running SSO schema migrations");

    let migrator = Migrator {
        migrations: Cow::Owned(migrations),
        ignore_missing: false,
        locking: true,
        no_tx: false,
    };

    migrator
        .run(pool)
        .await
        .map_err(|e| StorageError::migration(format!("Migration failed: {e}")))?;

    info!("SSO schema migrations completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_ordered() {
        let migrations = build_migrations();
        assert!(!migrations.is_empty());
        assert!(
            migrations
                .windows(2)
                .all(|pair| pair[0].version < pair[1].version)
        );
    }

    #[test]
    fn test_schema_has_unique_token() {
        let migrations = build_migrations();
        let sql = &migrations[0].sql;
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS sso_token"));
        assert!(sql.contains("token VARCHAR(64) NOT NULL UNIQUE"));
    }
}
