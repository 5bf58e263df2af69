//! Core trait definitions for the remote row store, the local cache, and
//! the identity provider.
//!
//! These traits are implemented by the `formscore-store` crate; the form
//! engine depends only on the seams defined here so every collaborator
//! can be swapped for a test double.

use async_trait::async_trait;

use crate::access::Principal;
use crate::error::{CacheError, StoreError};
use crate::model::{FormDefinition, SubmittedResponse};

// ---------------------------------------------------------------------------
// Remote row store
// ---------------------------------------------------------------------------

/// The authoritative remote store, exposing row operations against the
/// "form definitions" and "submitted responses" collections.
///
/// Every method is a suspension point; the engine treats each call as
/// fire-and-confirm, never transactional.
#[async_trait]
pub trait FormStore: Send + Sync {
    /// Insert a new form row.
    async fn insert_form(&self, form: &FormDefinition) -> Result<(), StoreError>;

    /// Replace an existing form row by id.
    async fn update_form(&self, form: &FormDefinition) -> Result<(), StoreError>;

    /// Delete a form row by id.
    async fn delete_form(&self, form_id: &str) -> Result<(), StoreError>;

    /// Fetch a single form row by id.
    async fn fetch_form(&self, form_id: &str) -> Result<FormDefinition, StoreError>;

    /// Fetch every form row.
    async fn fetch_all_forms(&self) -> Result<Vec<FormDefinition>, StoreError>;

    /// Insert a submitted response row.
    async fn insert_response(&self, response: &SubmittedResponse) -> Result<(), StoreError>;

    /// Fetch all responses filtered by form id.
    async fn fetch_responses(&self, form_id: &str) -> Result<Vec<SubmittedResponse>, StoreError>;

    /// Delete all responses for a form.
    async fn delete_responses(&self, form_id: &str) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// Local durable cache
// ---------------------------------------------------------------------------

/// A local durable key-value cache used only for offline fallback and
/// startup speed. Values are JSON strings.
pub trait CacheStore: Send {
    /// Read a value, `None` when the key is absent or unreadable.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value. Fails with `CacheError::QuotaExceeded` when the
    /// write would push the cache past its storage quota.
    fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError>;

    /// Remove a key. Removing an absent key is not an error.
    fn remove(&mut self, key: &str);
}

/// Well-known cache keys.
pub const FORMS_SNAPSHOT_KEY: &str = "formscore.forms";
pub const RESPONSES_SNAPSHOT_KEY: &str = "formscore.responses";

// ---------------------------------------------------------------------------
// Identity provider
// ---------------------------------------------------------------------------

/// External collaborator supplying the current caller's identity.
///
/// The engine only reads the email and standing; it never authenticates
/// credentials itself.
pub trait IdentityProvider: Send + Sync {
    fn current(&self) -> Option<Principal>;
}
