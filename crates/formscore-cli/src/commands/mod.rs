//! Subcommand implementations and shared setup helpers.

pub mod create;
pub mod delete;
pub mod init;
pub mod link;
pub mod list;
pub mod responses;
pub mod score;
pub mod submit;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use formscore_core::access::Principal;
use formscore_core::engine::{FormEngine, FormEngineConfig};
use formscore_core::error::EngineError;
use formscore_core::model::ResponseSet;
use formscore_core::traits::IdentityProvider;
use formscore_store::{create_store, load_config_from, FileCache, FormscoreConfig, StaticIdentity};

/// Load config and build an engine wired to the configured store and a
/// file-backed cache.
pub(crate) fn build_engine(config_path: Option<&Path>) -> Result<(FormscoreConfig, FormEngine)> {
    let config = load_config_from(config_path)?;
    let store = create_store(&config.store);
    let cache = FileCache::open(&config.cache_dir, config.cache_quota_bytes)
        .map_err(|e| anyhow::anyhow!("failed to open cache: {e}"))?;
    let engine = FormEngine::new(
        store,
        Box::new(cache),
        FormEngineConfig {
            response_cache_cap: config.response_cache_cap,
        },
    );
    Ok((config, engine))
}

/// Pull all forms into the engine cache, degrading to the local snapshot
/// with a warning when the remote store is down.
pub(crate) async fn preload(engine: &mut FormEngine) -> Result<()> {
    match engine.load_all().await {
        Ok(()) => Ok(()),
        Err(EngineError::RemoteUnavailable { source }) => {
            eprintln!("Warning: remote store unavailable ({source}); working from local data.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Build the acting identity from flags and config. The CLI stands in
/// for the identity provider the hosted application would supply.
pub(crate) fn principal_from(
    as_email: Option<String>,
    admin: bool,
    config: &FormscoreConfig,
) -> Option<Principal> {
    let identity = match as_email.or_else(|| config.operator_email.clone()) {
        Some(email) if admin => StaticIdentity::new(Some(Principal::admin(&email))),
        Some(email) => StaticIdentity::new(Some(Principal::authenticated(&email))),
        None => StaticIdentity::anonymous(),
    };
    identity.current()
}

/// Read an answers file: a JSON object mapping field id to answer value.
pub(crate) fn read_answers(path: &PathBuf) -> Result<ResponseSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answers file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse answers JSON: {}", path.display()))
}
