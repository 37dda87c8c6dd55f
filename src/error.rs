//! Gateway error taxonomy.
//!
//! Two families matter at the boundary: client input errors (malformed
//! pipeline, unresolvable database) that map to 400 and are never retried,
//! and store/execution failures that map to 500 with the underlying message
//! surfaced. Advisory failures — the pre-flight counts — are not errors at
//! all; they degrade to "unknown" inside the executor.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Malformed request input: unparseable pipeline JSON, a non-array
    /// pipeline, a non-object stage, a schema request with no database.
    #[error("{0}")]
    InvalidRequest(String),

    /// No explicit database, no index entry for the collection, and no
    /// configured default.
    #[error("database for collection '{0}' could not be inferred; pass db_name explicitly or configure mongodb.default_db")]
    UnresolvedDatabase(String),

    /// The store failed underneath an essential operation (aggregation,
    /// enumeration). Carries the full underlying message.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl GatewayError {
    /// Whether the caller, not the store, is at fault (4xx vs 5xx).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            GatewayError::InvalidRequest(_) | GatewayError::UnresolvedDatabase(_)
        )
    }

    /// Machine-readable code for HTTP error bodies.
    pub fn code(&self) -> &'static str {
        if self.is_client_error() {
            "bad_request"
        } else {
            "internal"
        }
    }
}
