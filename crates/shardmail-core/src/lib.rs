//! Shardmail Core
//!
//! Arithmetic and symmetric cryptography shared by secret sharing and
//! messaging.
//!
//! # Field Arithmetic
//!
//! Shares live in GF(P) for the fixed 256-bit prime `P = 2^256 - 189`.
//!
//! # Encryption
//!
//! - Shares at rest: PBKDF2-HMAC-SHA256 (100 000 rounds) + AES-256-GCM
//! - Message bodies: PBKDF2-derived session key + ChaCha20-Poly1305
//!
//! Nothing in this crate performs I/O or holds global mutable state; every
//! function is safe to call from any thread.

pub mod cipher;
pub mod crypto;
pub mod field;
pub mod kdf;

pub use cipher::{decrypt, encrypt, Iv, SealedMessage};
pub use crypto::{open_with_password, seal_with_password, CryptoError, PasswordBlob};
pub use field::{FieldElement, FieldError};
pub use kdf::{derive_session_key, SessionKey, DEFAULT_CONTEXT};
