//! Shardmail Shamir Module
//!
//! Split a private key into redundant shares over GF(P), protect each share
//! with a password, and hand the encrypted shares to a registry.
//!
//! # Two Strategies
//!
//! ## Local field
//! - Polynomial generation and Lagrange interpolation in-process
//! - Randomness injected by the caller
//!
//! ## Remote contract
//! - Split/reconstruct delegated to an on-chain contract
//! - Inputs and outputs validated against the same field as the local path
//!
//! Both implement [`SharingStrategy`] and are interchangeable.
//!
//! # Example: Split a 32-byte key
//!
//! ```
//! use shardmail_shamir::{reconstruct, split, Secret};
//!
//! let mut key = vec![0u8; 32];
//! key[31] = 0x2a;
//! let secret = Secret::new(key.clone());
//!
//! // Split into 3-of-5 shares
//! let shares = split(&secret, 5, 3).unwrap();
//!
//! // Recover with any 3
//! let subset = [shares[0].clone(), shares[2].clone(), shares[4].clone()];
//! let recovered = reconstruct(&subset, 32).unwrap();
//! assert_eq!(recovered.as_bytes(), key.as_slice());
//! ```
//!
//! # Below-threshold reconstruction
//!
//! [`reconstruct`] cannot tell whether it was given enough shares. With
//! fewer than `threshold` shares it returns a well-formed but meaningless
//! value and no error. Shares carry no checksum over the secret, and adding
//! one would change the output for share sets already issued.

pub mod backup;
pub mod protect;
pub mod registry;
pub mod shamir;
pub mod strategy;

// Re-exports
pub use backup::{backup_secret, recover_secret, recover_secret_from};
pub use protect::{protect, protect_with_rng, unprotect, unprotect_bytes, EncryptedShare};
pub use registry::{InMemoryShareRegistry, ShareRegistry};
pub use shamir::{reconstruct, split, split_with_rng, verify_shares, Secret, Share};
pub use strategy::{
    ContractShare, LocalFieldStrategy, RemoteContractStrategy, ShareContract, SharingStrategy,
};

use serde::{Deserialize, Serialize};
use shardmail_core::{CryptoError, FieldError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShamirError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("Arithmetic error: {0}")]
    Arithmetic(String),
    #[error("Encoding error: {0}")]
    Encoding(String),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error("Share registry error: {0}")]
    Registry(String),
    #[error("Share contract error: {0}")]
    Contract(String),
}

impl From<FieldError> for ShamirError {
    fn from(e: FieldError) -> Self {
        match e {
            FieldError::NotInvertible => ShamirError::Arithmetic(e.to_string()),
            FieldError::DoesNotFit { .. } => ShamirError::Encoding(e.to_string()),
            FieldError::OutOfRange | FieldError::InvalidEncoding(_) => {
                ShamirError::InvalidParameters(e.to_string())
            }
        }
    }
}

/// Configuration for a Shamir split.
///
/// Shares themselves carry no `(total, threshold)` metadata; this travels
/// alongside them (the registry stores it per owner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShamirConfig {
    /// Minimum shares needed to reconstruct (M)
    pub threshold: u8,
    /// Total shares to generate (N)
    pub total_shares: u8,
}

impl ShamirConfig {
    pub fn new(total_shares: u8, threshold: u8) -> Result<Self, ShamirError> {
        let config = Self {
            threshold,
            total_shares,
        };
        config.validate()?;
        Ok(config)
    }

    /// Common 2-of-3 setup
    pub fn two_of_three() -> Self {
        Self {
            threshold: 2,
            total_shares: 3,
        }
    }

    /// Common 3-of-5 setup
    pub fn three_of_five() -> Self {
        Self {
            threshold: 3,
            total_shares: 5,
        }
    }

    /// Validate configuration: `1 <= threshold <= total_shares`
    pub fn validate(&self) -> Result<(), ShamirError> {
        if self.threshold < 1 {
            return Err(ShamirError::InvalidParameters(
                "threshold must be at least 1".into(),
            ));
        }
        if self.threshold > self.total_shares {
            return Err(ShamirError::InvalidParameters(format!(
                "threshold {} exceeds share count {}",
                self.threshold, self.total_shares
            )));
        }
        Ok(())
    }
}

impl Default for ShamirConfig {
    fn default() -> Self {
        Self::three_of_five()
    }
}
