//! Session key derivation
//!
//! Sender and recipient each hold the same key-agreement identifier
//! (`key_id`) and derive the same symmetric key from it, with no further
//! exchange. The context label acts as the PBKDF2 salt; it is public.

use crate::crypto::{derive_key, KEY_LEN};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Context label used when none is configured
pub const DEFAULT_CONTEXT: &str = "shardmail/message-key/v1";

/// 256-bit symmetric key for a single message.
///
/// Not `Clone`: a key lives only as long as the encrypt or decrypt call
/// that derived it.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SessionKey([u8; KEY_LEN]);

impl SessionKey {
    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(..)")
    }
}

/// Derive the session key for `shared_secret_id` under `context`.
///
/// Deterministic: identical inputs always give identical keys.
pub fn derive_session_key(shared_secret_id: &str, context: &str) -> SessionKey {
    let key = derive_key(shared_secret_id.as_bytes(), context.as_bytes());
    SessionKey(*key)
}
