//! External services the messaging flow talks to
//!
//! In production these are a ledger contract (public keys and key
//! agreement) and a content-addressed store. Everything here is
//! request/response; no call is retried.

use crate::MessagingError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier the content store returns for stored bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentAddress(String);

impl ContentAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maps an address to its registered public key
#[async_trait]
pub trait PublicKeyDirectory: Send + Sync {
    async fn register_public_key(
        &self,
        owner: &str,
        public_key: &[u8],
    ) -> Result<(), MessagingError>;

    async fn get_public_key(&self, address: &str) -> Result<Vec<u8>, MessagingError>;
}

/// Agrees on a shared key identifier for a recipient and ephemeral key.
///
/// Sender and recipient must obtain the same `key_id` for the same
/// `(recipient, ephemeral_public_key)`; the session key is derived from it.
#[async_trait]
pub trait KeyAgreementService: Send + Sync {
    async fn compute_shared_key(
        &self,
        recipient_address: &str,
        ephemeral_public_key: &[u8],
    ) -> Result<String, MessagingError>;
}

/// Immutable content-addressed storage
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn put(&self, data: Vec<u8>) -> Result<ContentAddress, MessagingError>;

    async fn get(&self, address: &ContentAddress) -> Result<Vec<u8>, MessagingError>;
}
