//! Share registry interface
//!
//! The registry (a ledger contract in production) stores each owner's
//! encrypted shares as opaque bytes together with `(total, threshold)`.
//! Position `i` in the stored list is zero-based; the share's own `x` is
//! inside the encrypted payload.

use crate::{ShamirConfig, ShamirError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Remote storage for encrypted shares
#[async_trait]
pub trait ShareRegistry: Send + Sync {
    /// Replace `owner`'s stored shares
    async fn store_shares(
        &self,
        owner: &str,
        encrypted_shares: Vec<Vec<u8>>,
        total: u8,
        threshold: u8,
    ) -> Result<(), ShamirError>;

    /// Encrypted share at zero-based `index`
    async fn get_share(&self, owner: &str, index: u8) -> Result<Vec<u8>, ShamirError>;

    /// `(total, threshold)` recorded for `owner`
    async fn get_share_config(&self, owner: &str) -> Result<ShamirConfig, ShamirError>;
}

#[derive(Debug, Clone)]
struct StoredShares {
    shares: Vec<Vec<u8>>,
    config: ShamirConfig,
}

/// Registry held in process memory
#[derive(Debug, Default)]
pub struct InMemoryShareRegistry {
    owners: Mutex<HashMap<String, StoredShares>>,
}

impl InMemoryShareRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_owners<T>(
        &self,
        f: impl FnOnce(&mut HashMap<String, StoredShares>) -> Result<T, ShamirError>,
    ) -> Result<T, ShamirError> {
        let mut owners = self
            .owners
            .lock()
            .map_err(|e| ShamirError::Registry(e.to_string()))?;
        f(&mut owners)
    }
}

#[async_trait]
impl ShareRegistry for InMemoryShareRegistry {
    async fn store_shares(
        &self,
        owner: &str,
        encrypted_shares: Vec<Vec<u8>>,
        total: u8,
        threshold: u8,
    ) -> Result<(), ShamirError> {
        let config = ShamirConfig::new(total, threshold)?;
        if encrypted_shares.len() != usize::from(total) {
            return Err(ShamirError::Registry(format!(
                "Got {} shares for a total of {}",
                encrypted_shares.len(),
                total
            )));
        }

        self.with_owners(|owners| {
            owners.insert(
                owner.to_string(),
                StoredShares {
                    shares: encrypted_shares,
                    config,
                },
            );
            Ok(())
        })
    }

    async fn get_share(&self, owner: &str, index: u8) -> Result<Vec<u8>, ShamirError> {
        self.with_owners(|owners| {
            let stored = owners
                .get(owner)
                .ok_or_else(|| ShamirError::Registry(format!("No shares for {}", owner)))?;
            stored
                .shares
                .get(usize::from(index))
                .cloned()
                .ok_or_else(|| ShamirError::Registry(format!("No share at index {}", index)))
        })
    }

    async fn get_share_config(&self, owner: &str) -> Result<ShamirConfig, ShamirError> {
        self.with_owners(|owners| {
            owners
                .get(owner)
                .map(|stored| stored.config)
                .ok_or_else(|| ShamirError::Registry(format!("No shares for {}", owner)))
        })
    }
}
