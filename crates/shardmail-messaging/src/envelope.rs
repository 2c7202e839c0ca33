//! Message envelope codec
//!
//! Envelopes are JSON objects with these exact field names; byte fields are
//! arrays of integers 0–255 so any implementation can read them:
//!
//! ```json
//! {
//!   "key_id": "0x…",
//!   "sender_address": "0x…",
//!   "sender_id": "…",
//!   "recipient_address": "0x…",
//!   "iv": [12 bytes],
//!   "ciphertext": [ciphertext || tag],
//!   "ephemeral_public_key": [33 or 65 bytes],
//!   "timestamp": 1700000000000,
//!   "message_type": "text"
//! }
//! ```
//!
//! The serialized bytes are exactly what goes into the content store.

use crate::MessagingError;
use secp256k1::PublicKey;
use serde::{Deserialize, Serialize};
use shardmail_core::cipher::IV_LEN;

/// Kind of payload carried by an envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Text,
    File,
    KeyRotation,
}

/// An encrypted message, immutable once built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    /// Key-agreement identifier both sides derive the session key from
    pub key_id: String,
    pub sender_address: String,
    pub sender_id: String,
    pub recipient_address: String,
    pub iv: [u8; IV_LEN],
    /// Ciphertext followed by the 16-byte tag
    pub ciphertext: Vec<u8>,
    /// Sender's ephemeral secp256k1 public key (SEC1)
    pub ephemeral_public_key: Vec<u8>,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
    pub message_type: MessageType,
}

impl MessageEnvelope {
    /// Serialize for the content store
    pub fn encode(&self) -> Result<Vec<u8>, MessagingError> {
        serde_json::to_vec(self).map_err(|e| MessagingError::InvalidEnvelope(e.to_string()))
    }

    /// Parse an envelope addressed to `local_identity`.
    ///
    /// Fails with [`MessagingError::Unauthorized`] if the recipient is
    /// someone else. Addresses compare case-insensitively (hex checksums
    /// only differ in case).
    pub fn decode(bytes: &[u8], local_identity: &str) -> Result<Self, MessagingError> {
        let envelope: MessageEnvelope = serde_json::from_slice(bytes)
            .map_err(|e| MessagingError::InvalidEnvelope(e.to_string()))?;

        if !envelope.is_addressed_to(local_identity) {
            return Err(MessagingError::Unauthorized {
                recipient: envelope.recipient_address,
                local: local_identity.to_string(),
            });
        }

        envelope.validate()?;
        Ok(envelope)
    }

    pub fn is_addressed_to(&self, identity: &str) -> bool {
        self.recipient_address.eq_ignore_ascii_case(identity)
    }

    fn validate(&self) -> Result<(), MessagingError> {
        if self.key_id.is_empty() {
            return Err(MessagingError::InvalidEnvelope("empty key_id".into()));
        }
        PublicKey::from_slice(&self.ephemeral_public_key).map_err(|e| {
            MessagingError::InvalidEnvelope(format!("ephemeral_public_key: {}", e))
        })?;
        Ok(())
    }
}
