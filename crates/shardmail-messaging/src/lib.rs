//! Shardmail Messaging: end-to-end encrypted messages in content-addressed
//! envelopes.
//!
//! # Sending
//!
//! ```text
//! NoKey → EphemeralKeyGenerated → SharedSecretEstablished(key_id)
//!       → KeyDerived → Encrypted → Stored(envelope, address)
//! ```
//!
//! Each state is its own type and every transition consumes the previous
//! one, so a step cannot be repeated and the ephemeral key pair sent to the
//! key-agreement service is necessarily the one written into the envelope.
//! A failure anywhere aborts the send; start again from [`OutboundMessage`].
//!
//! # Receiving
//!
//! The envelope is fetched, its recipient checked against the local
//! identity, and only then is the session key derived and the body
//! decrypted.
//!
//! # Collaborators
//!
//! The public-key directory, key-agreement service and content store are
//! traits ([`collaborators`]); [`memory`] has in-process implementations.

use shardmail_core::CryptoError;
use thiserror::Error;

pub mod collaborators;
pub mod config;
pub mod envelope;
pub mod memory;
pub mod protocol;

// Re-export key types for consumers
pub use collaborators::{ContentAddress, ContentStore, KeyAgreementService, PublicKeyDirectory};
pub use config::MessagingConfig;
pub use envelope::{MessageEnvelope, MessageType};
pub use memory::{InMemoryContentStore, InMemoryLedger};
pub use protocol::{
    open_envelope, receive_message, send_message, EphemeralKeyPair, OutboundMessage,
    ReceivedMessage, Stored,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessagingError {
    /// Envelope belongs to someone else; nothing was derived or decrypted
    #[error("Envelope is addressed to {recipient}, not {local}")]
    Unauthorized { recipient: String, local: String },
    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error("Public key directory error: {0}")]
    Directory(String),
    #[error("Key agreement failed: {0}")]
    KeyAgreement(String),
    #[error("Content store error: {0}")]
    Store(String),
}
