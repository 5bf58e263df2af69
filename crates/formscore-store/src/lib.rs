//! formscore-store — Store and cache implementations.
//!
//! Implements the `FormStore` and `CacheStore` traits from
//! `formscore-core` over an HTTP row store, an in-memory test double,
//! and a quota-bounded file cache, plus the configuration layer that
//! wires them up.

pub mod cache;
pub mod config;
pub mod http;
pub mod memory;

pub use cache::{FileCache, MemoryCache, StaticIdentity};
pub use config::{create_store, load_config, load_config_from, FormscoreConfig, StoreConfig};
pub use http::HttpStore;
pub use memory::MemoryStore;
