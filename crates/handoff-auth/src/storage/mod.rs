//! Storage traits for broker data.
//!
//! This module defines storage interfaces for:
//!
//! - SSO tokens (create, lookup, atomic consume)
//! - Principals (read-only lookup)
//!
//! # Implementations
//!
//! - [`memory::InMemoryStorage`] - in-process backend for tests and
//!   single-node development
//! - `handoff-auth-postgres` - PostgreSQL storage backend

pub mod memory;
pub mod principal;
pub mod token;

use std::future::Future;
use std::time::Duration;

pub use memory::InMemoryStorage;
pub use principal::PrincipalStorage;
pub use token::{ConsumedToken, SsoTokenStorage};

use crate::HandoffResult;
use crate::error::HandoffError;

/// Runs a store operation with an upper time bound.
///
/// An elapsed deadline becomes [`HandoffError::Timeout`], so callers can tell
/// a slow store apart from a business rejection.
pub async fn with_timeout<T, F>(limit: Duration, operation: &str, fut: F) -> HandoffResult<T>
where
    F: Future<Output = HandoffResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(HandoffError::timeout(operation)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_passes_result_through() {
        let value = with_timeout(Duration::from_secs(1), "noop", async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_with_timeout_elapsed() {
        let result: HandoffResult<()> = with_timeout(Duration::from_millis(10), "slow", async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        match result {
            Err(HandoffError::Timeout { operation }) => assert_eq!(operation, "slow"),
            other => panic!("expected timeout, got {other:?}"),
        }
    }
}
