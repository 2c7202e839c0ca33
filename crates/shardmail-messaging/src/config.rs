//! Messaging configuration, parsed from TOML plus environment overrides.
//!
//! Priority: environment variables > config file > defaults.
//!
//! ```toml
//! [store]
//! endpoint = "http://127.0.0.1:5001/api/v0"
//! gateway = "https://ipfs.io/ipfs"
//!
//! [keys]
//! context = "shardmail/message-key/v1"
//! ```

use crate::collaborators::ContentAddress;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shardmail_core::kdf::DEFAULT_CONTEXT;
use std::path::Path;

/// Top-level messaging configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagingConfig {
    /// Content store the storage collaborator is built from
    #[serde(default)]
    pub store: StoreSection,

    /// Session-key derivation
    #[serde(default)]
    pub keys: KeySection,
}

/// Content store location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSection {
    /// HTTP API a networked [`ContentStore`](crate::ContentStore) client
    /// uploads to; see [`StoreSection::put_url`]
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Public gateway used to build retrieval URLs
    #[serde(default = "default_gateway")]
    pub gateway: String,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            gateway: default_gateway(),
        }
    }
}

impl StoreSection {
    /// Upload URL for a store client built on `endpoint`
    pub fn put_url(&self) -> String {
        format!("{}/add", self.endpoint.trim_end_matches('/'))
    }

    /// Gateway URL for content stored at `address`
    pub fn retrieval_url(&self, address: &ContentAddress) -> String {
        format!("{}/{}", self.gateway.trim_end_matches('/'), address)
    }
}

/// Key derivation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySection {
    /// Salt for session-key derivation; sender and recipient must agree
    #[serde(default = "default_context")]
    pub context: String,
}

impl Default for KeySection {
    fn default() -> Self {
        Self {
            context: default_context(),
        }
    }
}

// ============================================================================
// Default value functions
// ============================================================================

fn default_endpoint() -> String {
    "http://127.0.0.1:5001/api/v0".to_string()
}

fn default_gateway() -> String {
    "https://ipfs.io/ipfs".to_string()
}

fn default_context() -> String {
    DEFAULT_CONTEXT.to_string()
}

// ============================================================================
// Loading & environment override
// ============================================================================

impl MessagingConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).with_context(|| "Failed to parse TOML config")
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `SHARDMAIL_STORE_ENDPOINT`
    /// - `SHARDMAIL_STORE_GATEWAY`
    /// - `SHARDMAIL_KEY_CONTEXT`
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SHARDMAIL_STORE_ENDPOINT") {
            self.store.endpoint = v;
        }
        if let Ok(v) = std::env::var("SHARDMAIL_STORE_GATEWAY") {
            self.store.gateway = v;
        }
        if let Ok(v) = std::env::var("SHARDMAIL_KEY_CONTEXT") {
            self.keys.context = v;
        }
    }

    /// Validate that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.store.endpoint.is_empty(),
            "store.endpoint must not be empty"
        );
        anyhow::ensure!(
            !self.store.gateway.is_empty(),
            "store.gateway must not be empty"
        );
        anyhow::ensure!(
            !self.keys.context.is_empty(),
            "keys.context must not be empty"
        );
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
