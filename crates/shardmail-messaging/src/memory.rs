//! In-process collaborators
//!
//! [`InMemoryLedger`] stands in for the key contract: a public-key
//! directory plus a key-agreement service whose identifier is
//! `"0x" || hex(SHA-256(recipient_public_key || ephemeral_public_key))`.
//! [`InMemoryContentStore`] addresses content by the hex SHA-256 of the
//! stored bytes.

use crate::collaborators::{ContentAddress, ContentStore, KeyAgreementService, PublicKeyDirectory};
use crate::MessagingError;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

fn lock<'a, T>(
    mutex: &'a Mutex<T>,
    wrap: fn(String) -> MessagingError,
) -> Result<MutexGuard<'a, T>, MessagingError> {
    mutex.lock().map_err(|e| wrap(e.to_string()))
}

/// Public-key directory and key agreement held in memory
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    keys: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

// Addresses are hex; store them lowercased so lookups ignore checksum case
fn normalize(address: &str) -> String {
    address.to_ascii_lowercase()
}

#[async_trait]
impl PublicKeyDirectory for InMemoryLedger {
    async fn register_public_key(
        &self,
        owner: &str,
        public_key: &[u8],
    ) -> Result<(), MessagingError> {
        if public_key.is_empty() {
            return Err(MessagingError::Directory("Empty public key".into()));
        }
        let mut keys = lock(&self.keys, MessagingError::Directory)?;
        keys.insert(normalize(owner), public_key.to_vec());
        log::debug!("Registered public key for {}", owner);
        Ok(())
    }

    async fn get_public_key(&self, address: &str) -> Result<Vec<u8>, MessagingError> {
        let keys = lock(&self.keys, MessagingError::Directory)?;
        keys.get(&normalize(address))
            .cloned()
            .ok_or_else(|| MessagingError::Directory(format!("No public key for {}", address)))
    }
}

#[async_trait]
impl KeyAgreementService for InMemoryLedger {
    async fn compute_shared_key(
        &self,
        recipient_address: &str,
        ephemeral_public_key: &[u8],
    ) -> Result<String, MessagingError> {
        let keys = lock(&self.keys, MessagingError::KeyAgreement)?;
        let recipient_key = keys.get(&normalize(recipient_address)).ok_or_else(|| {
            MessagingError::KeyAgreement(format!(
                "Recipient {} has no registered public key",
                recipient_address
            ))
        })?;

        let mut hasher = Sha256::new();
        hasher.update(recipient_key);
        hasher.update(ephemeral_public_key);
        Ok(format!("0x{}", hex::encode(hasher.finalize())))
    }
}

/// Content-addressed store held in memory
#[derive(Debug, Default)]
pub struct InMemoryContentStore {
    objects: Mutex<HashMap<ContentAddress, Vec<u8>>>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.lock().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrite the bytes at `address` without changing the address
    #[cfg(test)]
    pub(crate) fn tamper(&self, address: &ContentAddress, data: Vec<u8>) -> Result<(), MessagingError> {
        let mut objects = lock(&self.objects, MessagingError::Store)?;
        match objects.get_mut(address) {
            Some(stored) => {
                *stored = data;
                Ok(())
            }
            None => Err(MessagingError::Store(format!("Unknown address {}", address))),
        }
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn put(&self, data: Vec<u8>) -> Result<ContentAddress, MessagingError> {
        let address = ContentAddress::new(hex::encode(Sha256::digest(&data)));
        let mut objects = lock(&self.objects, MessagingError::Store)?;
        objects.insert(address.clone(), data);
        Ok(address)
    }

    async fn get(&self, address: &ContentAddress) -> Result<Vec<u8>, MessagingError> {
        let objects = lock(&self.objects, MessagingError::Store)?;
        objects
            .get(address)
            .cloned()
            .ok_or_else(|| MessagingError::Store(format!("Nothing stored at {}", address)))
    }
}
