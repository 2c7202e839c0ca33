//! Cryptographic utilities
//!
//! Password-based sealing using PBKDF2-HMAC-SHA256 + AES-256-GCM.
//!
//! # Security Notes
//!
//! - PBKDF2 runs 100 000 iterations of HMAC-SHA256
//! - AES-256-GCM provides authenticated encryption
//! - Each seal uses a fresh random salt and nonce
//! - Password is never stored

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, CryptoRng, RngCore};
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroizing;

/// PBKDF2 iteration count
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Derived key length (256 bits)
pub const KEY_LEN: usize = 32;

/// Salt length for PBKDF2
pub const SALT_LEN: usize = 16;

/// Nonce length for both AEADs
pub const NONCE_LEN: usize = 12;

/// Authentication tag length for both AEADs
pub const TAG_LEN: usize = 16;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Tag did not verify: wrong key/password or tampered data
    #[error("Authentication failed")]
    AuthenticationFailed,
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),
    #[error("Invalid ciphertext format")]
    InvalidFormat,
}

/// PBKDF2-HMAC-SHA256 with the fixed iteration count.
///
/// Used both for password-sealed blobs (random salt) and for session keys
/// (fixed context as salt), so the two derivations never drift apart.
pub fn derive_key(material: &[u8], salt: &[u8]) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(material, salt, PBKDF2_ITERATIONS, key.as_mut());
    key
}

/// Password-sealed blob format:
/// [salt (16 bytes)][nonce (12 bytes)][ciphertext + tag (len + 16 bytes)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordBlob {
    /// Salt used for PBKDF2 key derivation
    salt: [u8; SALT_LEN],
    /// Nonce used for AES-256-GCM
    nonce: [u8; NONCE_LEN],
    /// Encrypted payload + authentication tag
    ciphertext: Vec<u8>,
}

impl PasswordBlob {
    /// Serialize to bytes: salt || nonce || ciphertext
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(SALT_LEN + NONCE_LEN + self.ciphertext.len());
        bytes.extend_from_slice(&self.salt);
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&self.ciphertext);
        bytes
    }

    /// Deserialize from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        // Minimum size: salt + nonce + tag (empty plaintext is allowed)
        if bytes.len() < SALT_LEN + NONCE_LEN + TAG_LEN {
            return Err(CryptoError::InvalidFormat);
        }

        let mut salt = [0u8; SALT_LEN];
        let mut nonce = [0u8; NONCE_LEN];

        salt.copy_from_slice(&bytes[0..SALT_LEN]);
        nonce.copy_from_slice(&bytes[SALT_LEN..SALT_LEN + NONCE_LEN]);
        let ciphertext = bytes[SALT_LEN + NONCE_LEN..].to_vec();

        Ok(Self {
            salt,
            nonce,
            ciphertext,
        })
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }
}

/// Seal a payload with a password using the OS random source
pub fn seal_with_password(plaintext: &[u8], password: &str) -> Result<PasswordBlob, CryptoError> {
    seal_with_password_rng(plaintext, password, &mut OsRng)
}

/// Seal a payload with a password
///
/// Draws a new salt and nonce from `rng` on every call.
///
/// # Arguments
/// * `plaintext` - Bytes to protect
/// * `password` - User-provided password
/// * `rng` - Cryptographically secure random source
pub fn seal_with_password_rng<R: RngCore + CryptoRng>(
    plaintext: &[u8],
    password: &str,
    rng: &mut R,
) -> Result<PasswordBlob, CryptoError> {
    let mut salt = [0u8; SALT_LEN];
    rng.fill_bytes(&mut salt);

    let mut nonce = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce);

    let key = derive_key(password.as_bytes(), &salt);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_ref()));
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    Ok(PasswordBlob {
        salt,
        nonce,
        ciphertext,
    })
}

/// Open a password-sealed blob
///
/// # Errors
/// Returns [`CryptoError::AuthenticationFailed`] if the password is wrong
/// or any byte of the blob was altered.
pub fn open_with_password(
    blob: &PasswordBlob,
    password: &str,
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let key = derive_key(password.as_bytes(), &blob.salt);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_ref()));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&blob.nonce), blob.ciphertext.as_slice())
        .map_err(|_| CryptoError::AuthenticationFailed)?;

    Ok(Zeroizing::new(plaintext))
}
