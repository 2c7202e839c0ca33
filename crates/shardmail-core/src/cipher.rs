//! Message body encryption with ChaCha20-Poly1305
//!
//! 256-bit key, 96-bit nonce, 128-bit tag. Nonces come only from a CSPRNG
//! through [`Iv::generate`], and [`encrypt`] takes the [`Iv`] by value, so a
//! nonce cannot be reused for a second message.

use crate::crypto::{CryptoError, NONCE_LEN};
use crate::kdf::SessionKey;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::{rngs::OsRng, CryptoRng, RngCore};

/// Length of a message IV
pub const IV_LEN: usize = NONCE_LEN;

/// A fresh random nonce for one message
#[derive(Debug, PartialEq, Eq)]
pub struct Iv([u8; IV_LEN]);

impl Iv {
    /// Draw a new IV from the OS random source
    pub fn random() -> Self {
        Self::generate(&mut OsRng)
    }

    /// Draw a new IV from `rng`
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut iv = [0u8; IV_LEN];
        rng.fill_bytes(&mut iv);
        Self(iv)
    }

    pub fn as_bytes(&self) -> &[u8; IV_LEN] {
        &self.0
    }
}

/// Output of [`encrypt`]: the IV that was used and `ciphertext || tag`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedMessage {
    pub iv: [u8; IV_LEN],
    pub ciphertext: Vec<u8>,
}

/// Encrypt a message body, consuming the IV
pub fn encrypt(key: &SessionKey, iv: Iv, plaintext: &[u8]) -> Result<SealedMessage, CryptoError> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv.0), plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    Ok(SealedMessage {
        iv: iv.0,
        ciphertext,
    })
}

/// Decrypt `ciphertext || tag`
///
/// # Errors
/// [`CryptoError::AuthenticationFailed`] on any tag mismatch. The message
/// is undecryptable; retrying with the same inputs cannot succeed.
pub fn decrypt(
    key: &SessionKey,
    iv: &[u8; IV_LEN],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    cipher
        .decrypt(Nonce::from_slice(iv), ciphertext)
        .map_err(|_| CryptoError::AuthenticationFailed)
}
