//! Store, cache, and engine error types.
//!
//! `StoreError` and `CacheError` live in `formscore-core` so the form
//! engine can classify failures for its fallback decisions without
//! string matching against messages produced in `formscore-store`.

use thiserror::Error;

/// Errors that can occur when talking to the remote row store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached at all.
    #[error("remote store unavailable: {0}")]
    Unavailable(String),

    /// The request timed out in transit.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The requested row does not exist.
    #[error("row not found: {0}")]
    NotFound(String),

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The store returned an error response.
    #[error("store error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// A payload could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Returns `true` when the failure means the store is unreachable and
    /// the engine should fall back to its local cache.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Timeout(_))
    }
}

/// Errors from the local durable cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The write would exceed the cache's storage quota.
    #[error("cache quota exceeded: {attempted_bytes} bytes attempted, {limit_bytes} allowed")]
    QuotaExceeded {
        attempted_bytes: u64,
        limit_bytes: u64,
    },

    /// An I/O failure on the cache backing.
    #[error("cache I/O error: {0}")]
    Io(String),
}

/// Caller-visible engine failures.
///
/// Nothing here is fatal: every variant means "operation not performed
/// (or performed locally only), caller informed".
#[derive(Debug, Error)]
pub enum EngineError {
    /// The input was rejected before any write happened.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The remote store was unreachable; the local edit was retained.
    #[error("remote store unavailable, change kept locally: {source}")]
    RemoteUnavailable {
        #[source]
        source: StoreError,
    },

    /// No form with that id is known locally or remotely.
    #[error("form not found: {0}")]
    FormNotFound(String),

    /// A non-availability store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}
