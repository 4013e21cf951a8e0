//! Principal storage.
//!
//! The broker only reads principals. `upsert`, `set_status` and
//! `soft_delete` exist for seeding and administrative tooling.

use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use time::OffsetDateTime;
use uuid::Uuid;

use handoff_auth::types::{Principal, PrincipalStatus};

use crate::{PgPool, StorageResult};

type PrincipalTuple = (
    Uuid,
    String,
    String,
    String,
    String,
    String,
    Option<OffsetDateTime>,
);

fn principal_from_tuple(row: PrincipalTuple) -> Principal {
    Principal {
        id: row.0,
        external_id: row.1,
        name: row.2,
        email: row.3,
        role: row.4,
        status: PrincipalStatus::parse(&row.5),
        deleted_at: row.6,
    }
}

/// Principal storage operations.
pub struct PrincipalStorage<'a> {
    pool: &'a PgPool,
}

impl<'a> PrincipalStorage<'a> {
    /// Create a new principal storage with a connection pool reference.
    #[must_use]
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find a principal by id, including inactive and soft-deleted ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> StorageResult<Option<Principal>> {
        let row: Option<PrincipalTuple> = query_as(
            r#"
            SELECT id, external_id, name, email, role, status, deleted_at
            FROM principal
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(principal_from_tuple))
    }

    /// Insert a principal or overwrite the one with the same id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails (including a unique
    /// violation on `external_id` or `email` held by another row).
    pub async fn upsert(&self, principal: &Principal) -> StorageResult<()> {
        query(
            r#"
            INSERT INTO principal (id, external_id, name, email, role, status, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                external_id = EXCLUDED.external_id,
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                role = EXCLUDED.role,
                status = EXCLUDED.status,
                deleted_at = EXCLUDED.deleted_at,
                updated_at = NOW()
            "#,
        )
        .bind(principal.id)
        .bind(&principal.external_id)
        .bind(&principal.name)
        .bind(&principal.email)
        .bind(&principal.role)
        .bind(principal.status.as_str())
        .bind(principal.deleted_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Change a principal's status. Returns `false` if no such principal.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn set_status(&self, id: Uuid, status: PrincipalStatus) -> StorageResult<bool> {
        let result = query("UPDATE principal SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Soft-delete a principal. Returns `false` if no such principal.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn soft_delete(&self, id: Uuid) -> StorageResult<bool> {
        let result = query(
            "UPDATE principal SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
