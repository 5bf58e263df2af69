//! Configuration and store factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use formscore_core::traits::FormStore;

use crate::http::HttpStore;
use crate::memory::MemoryStore;

/// Configuration for the remote store backend.
///
/// Note: Custom Debug impl masks the API key to prevent accidental
/// exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    Http {
        base_url: String,
        api_key: String,
    },
    Memory,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreConfig::Http { base_url, api_key: _ } => f
                .debug_struct("Http")
                .field("base_url", base_url)
                .field("api_key", &"***")
                .finish(),
            StoreConfig::Memory => f.debug_struct("Memory").finish(),
        }
    }
}

/// Top-level formscore configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormscoreConfig {
    /// Remote store backend.
    #[serde(default = "default_store")]
    pub store: StoreConfig,
    /// Directory for the durable local cache.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// Storage quota for the local cache in bytes.
    #[serde(default = "default_cache_quota")]
    pub cache_quota_bytes: u64,
    /// How many response records survive a cache trim.
    #[serde(default = "default_response_cache_cap")]
    pub response_cache_cap: usize,
    /// Email the CLI acts as when no explicit identity is given.
    #[serde(default)]
    pub operator_email: Option<String>,
}

fn default_store() -> StoreConfig {
    StoreConfig::Memory
}
fn default_cache_dir() -> PathBuf {
    PathBuf::from("./.formscore-cache")
}
fn default_cache_quota() -> u64 {
    4 * 1024 * 1024
}
fn default_response_cache_cap() -> usize {
    50
}

impl Default for FormscoreConfig {
    fn default() -> Self {
        Self {
            store: default_store(),
            cache_dir: default_cache_dir(),
            cache_quota_bytes: default_cache_quota(),
            response_cache_cap: default_response_cache_cap(),
            operator_email: None,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_store_config(config: &StoreConfig) -> StoreConfig {
    match config {
        StoreConfig::Http { base_url, api_key } => StoreConfig::Http {
            base_url: resolve_env_vars(base_url),
            api_key: resolve_env_vars(api_key),
        },
        StoreConfig::Memory => StoreConfig::Memory,
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `formscore.toml` in the current directory
/// 2. `~/.config/formscore/config.toml`
///
/// Environment variable override: `FORMSCORE_API_KEY`.
pub fn load_config() -> Result<FormscoreConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<FormscoreConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("formscore.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<FormscoreConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => FormscoreConfig::default(),
    };

    // Apply the env var override
    if let Ok(key) = std::env::var("FORMSCORE_API_KEY") {
        if let StoreConfig::Http { api_key, .. } = &mut config.store {
            *api_key = key;
        }
    }

    config.store = resolve_store_config(&config.store);

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("formscore"))
}

/// Create a store instance from its configuration.
pub fn create_store(config: &StoreConfig) -> Arc<dyn FormStore> {
    match config {
        StoreConfig::Http { base_url, api_key } => Arc::new(HttpStore::new(base_url, api_key)),
        StoreConfig::Memory => Arc::new(MemoryStore::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_FORMSCORE_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_FORMSCORE_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_FORMSCORE_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        std::env::remove_var("_FORMSCORE_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = FormscoreConfig::default();
        assert!(matches!(config.store, StoreConfig::Memory));
        assert_eq!(config.response_cache_cap, 50);
        assert_eq!(config.cache_quota_bytes, 4 * 1024 * 1024);
    }

    #[test]
    fn parse_http_store_config() {
        let toml_str = r#"
cache_dir = "/tmp/formscore"
response_cache_cap = 25
operator_email = "ops@example.com"

[store]
type = "http"
base_url = "https://rows.example.com"
api_key = "sk-test"
"#;
        let config: FormscoreConfig = toml::from_str(toml_str).unwrap();
        assert!(matches!(config.store, StoreConfig::Http { .. }));
        assert_eq!(config.response_cache_cap, 25);
        assert_eq!(config.operator_email.as_deref(), Some("ops@example.com"));
    }

    #[test]
    fn debug_masks_api_key() {
        let config = StoreConfig::Http {
            base_url: "https://rows.example.com".into(),
            api_key: "sk-secret".into(),
        };
        let printed = format!("{config:?}");
        assert!(!printed.contains("sk-secret"));
        assert!(printed.contains("***"));
    }
}
