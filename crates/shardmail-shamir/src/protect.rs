//! Password protection for individual shares
//!
//! A share is serialized as `{"x":<index>,"y":"<decimal>"}` and sealed with
//! PBKDF2-HMAC-SHA256 + AES-256-GCM. The GCM tag is the only integrity
//! check on the recovery path: a share that fails it is never returned.

use crate::shamir::Share;
use rand::{rngs::OsRng, CryptoRng, RngCore};
use shardmail_core::crypto::{
    open_with_password, seal_with_password_rng, CryptoError, PasswordBlob,
};
use zeroize::Zeroizing;

/// Encrypted share format:
/// [salt (16 bytes)][iv (12 bytes)][ciphertext + tag]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedShare(PasswordBlob);

impl EncryptedShare {
    /// Serialize to bytes: salt || iv || ciphertext
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_bytes()
    }

    /// Deserialize from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        PasswordBlob::from_bytes(bytes).map(Self)
    }
}

/// Encrypt a share with a password using the OS random source
pub fn protect(share: &Share, password: &str) -> Result<EncryptedShare, CryptoError> {
    protect_with_rng(share, password, &mut OsRng)
}

/// Encrypt a share with a password
///
/// Each call draws a new salt and IV from `rng`.
pub fn protect_with_rng<R: RngCore + CryptoRng>(
    share: &Share,
    password: &str,
    rng: &mut R,
) -> Result<EncryptedShare, CryptoError> {
    let plaintext = Zeroizing::new(
        serde_json::to_vec(share).map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?,
    );
    seal_with_password_rng(&plaintext, password, rng).map(EncryptedShare)
}

/// Decrypt a share
///
/// # Errors
/// * [`CryptoError::AuthenticationFailed`] if the password is wrong or the
///   blob was tampered with
/// * [`CryptoError::InvalidFormat`] if the authenticated payload is not a share
pub fn unprotect(encrypted: &EncryptedShare, password: &str) -> Result<Share, CryptoError> {
    let plaintext = open_with_password(&encrypted.0, password)?;
    serde_json::from_slice(&plaintext).map_err(|_| CryptoError::InvalidFormat)
}

/// Decrypt a share straight from registry bytes
pub fn unprotect_bytes(bytes: &[u8], password: &str) -> Result<Share, CryptoError> {
    unprotect(&EncryptedShare::from_bytes(bytes)?, password)
}
