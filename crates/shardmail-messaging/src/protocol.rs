//! Send and receive flow
//!
//! Sending walks a chain of one-shot states; each method consumes the
//! current state and returns the next. Receiving is a single call.

use crate::collaborators::{ContentAddress, ContentStore, KeyAgreementService};
use crate::envelope::{MessageEnvelope, MessageType};
use crate::MessagingError;
use rand::{CryptoRng, Rng};
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use shardmail_core::cipher::{decrypt, encrypt, Iv};
use shardmail_core::kdf::{derive_session_key, SessionKey};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use zeroize::Zeroizing;

/// Per-message secp256k1 key pair. Never persisted.
pub struct EphemeralKeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl EphemeralKeyPair {
    pub fn generate() -> Self {
        Self::generate_with_rng(&mut rand::thread_rng())
    }

    pub fn generate_with_rng<R: Rng + CryptoRng + ?Sized>(rng: &mut R) -> Self {
        let secp = Secp256k1::signing_only();
        let secret = SecretKey::new(rng);
        let public = PublicKey::from_secret_key(&secp, &secret);
        Self { secret, public }
    }

    /// Compressed SEC1 encoding
    pub fn public_key_bytes(&self) -> [u8; 33] {
        self.public.serialize()
    }
}

impl Drop for EphemeralKeyPair {
    fn drop(&mut self) {
        self.secret.non_secure_erase();
    }
}

impl fmt::Debug for EphemeralKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EphemeralKeyPair")
            .field("public", &hex::encode(self.public_key_bytes()))
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
struct Header {
    sender_address: String,
    sender_id: String,
    recipient_address: String,
    message_type: MessageType,
}

/// A message with no key material yet
#[derive(Debug)]
pub struct OutboundMessage {
    header: Header,
}

impl OutboundMessage {
    pub fn new(
        sender_address: impl Into<String>,
        sender_id: impl Into<String>,
        recipient_address: impl Into<String>,
        message_type: MessageType,
    ) -> Self {
        Self {
            header: Header {
                sender_address: sender_address.into(),
                sender_id: sender_id.into(),
                recipient_address: recipient_address.into(),
                message_type,
            },
        }
    }

    pub fn generate_ephemeral_key(self) -> EphemeralKeyGenerated {
        self.with_ephemeral_key(EphemeralKeyPair::generate())
    }

    pub fn generate_ephemeral_key_with_rng<R: Rng + CryptoRng + ?Sized>(
        self,
        rng: &mut R,
    ) -> EphemeralKeyGenerated {
        self.with_ephemeral_key(EphemeralKeyPair::generate_with_rng(rng))
    }

    fn with_ephemeral_key(self, ephemeral: EphemeralKeyPair) -> EphemeralKeyGenerated {
        EphemeralKeyGenerated {
            header: self.header,
            ephemeral,
        }
    }
}

#[derive(Debug)]
pub struct EphemeralKeyGenerated {
    header: Header,
    ephemeral: EphemeralKeyPair,
}

impl EphemeralKeyGenerated {
    pub fn ephemeral_public_key(&self) -> [u8; 33] {
        self.ephemeral.public_key_bytes()
    }

    /// Ask the key-agreement service for this message's `key_id`
    pub async fn establish_shared_secret<K>(
        self,
        agreement: &K,
    ) -> Result<SharedSecretEstablished, MessagingError>
    where
        K: KeyAgreementService + ?Sized,
    {
        let key_id = agreement
            .compute_shared_key(
                &self.header.recipient_address,
                &self.ephemeral.public_key_bytes(),
            )
            .await?;

        Ok(SharedSecretEstablished {
            header: self.header,
            ephemeral: self.ephemeral,
            key_id,
        })
    }
}

#[derive(Debug)]
pub struct SharedSecretEstablished {
    header: Header,
    ephemeral: EphemeralKeyPair,
    key_id: String,
}

impl SharedSecretEstablished {
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn derive_key(self, context: &str) -> KeyDerived {
        let key = derive_session_key(&self.key_id, context);
        KeyDerived {
            header: self.header,
            ephemeral: self.ephemeral,
            key_id: self.key_id,
            key,
        }
    }
}

#[derive(Debug)]
pub struct KeyDerived {
    header: Header,
    ephemeral: EphemeralKeyPair,
    key_id: String,
    key: SessionKey,
}

impl KeyDerived {
    pub fn encrypt(self, plaintext: &[u8]) -> Result<Encrypted, MessagingError> {
        self.seal(Iv::random(), plaintext)
    }

    pub fn encrypt_with_rng<R: Rng + CryptoRng>(
        self,
        rng: &mut R,
        plaintext: &[u8],
    ) -> Result<Encrypted, MessagingError> {
        self.seal(Iv::generate(rng), plaintext)
    }

    fn seal(self, iv: Iv, plaintext: &[u8]) -> Result<Encrypted, MessagingError> {
        let sealed = encrypt(&self.key, iv, plaintext)?;
        let Header {
            sender_address,
            sender_id,
            recipient_address,
            message_type,
        } = self.header;

        Ok(Encrypted {
            envelope: MessageEnvelope {
                key_id: self.key_id,
                sender_address,
                sender_id,
                recipient_address,
                iv: sealed.iv,
                ciphertext: sealed.ciphertext,
                ephemeral_public_key: self.ephemeral.public_key_bytes().to_vec(),
                timestamp: now_millis(),
                message_type,
            },
        })
    }
}

#[derive(Debug)]
pub struct Encrypted {
    envelope: MessageEnvelope,
}

impl Encrypted {
    pub fn envelope(&self) -> &MessageEnvelope {
        &self.envelope
    }

    /// Write the encoded envelope to the content store
    pub async fn store<C>(self, store: &C) -> Result<Stored, MessagingError>
    where
        C: ContentStore + ?Sized,
    {
        let bytes = self.envelope.encode()?;
        let address = store.put(bytes).await?;
        log::info!(
            "Stored {:?} message for {} at {}",
            self.envelope.message_type,
            self.envelope.recipient_address,
            address
        );
        Ok(Stored {
            envelope: self.envelope,
            address,
        })
    }
}

/// Final state of a send
#[derive(Debug, Clone)]
pub struct Stored {
    pub envelope: MessageEnvelope,
    pub address: ContentAddress,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Run the whole send chain with fresh randomness
pub async fn send_message<K, C>(
    agreement: &K,
    store: &C,
    message: OutboundMessage,
    context: &str,
    plaintext: &[u8],
) -> Result<Stored, MessagingError>
where
    K: KeyAgreementService + ?Sized,
    C: ContentStore + ?Sized,
{
    let established = message
        .generate_ephemeral_key()
        .establish_shared_secret(agreement)
        .await?;
    log::debug!("Established key agreement for outbound message");

    established
        .derive_key(context)
        .encrypt(plaintext)?
        .store(store)
        .await
}

/// A decrypted inbound message
#[derive(Debug)]
pub struct ReceivedMessage {
    pub envelope: MessageEnvelope,
    pub plaintext: Zeroizing<Vec<u8>>,
}

/// Check the recipient, then derive the session key and decrypt
pub fn open_envelope(
    bytes: &[u8],
    local_identity: &str,
    context: &str,
) -> Result<ReceivedMessage, MessagingError> {
    let envelope = MessageEnvelope::decode(bytes, local_identity)?;
    let key = derive_session_key(&envelope.key_id, context);
    let plaintext = decrypt(&key, &envelope.iv, &envelope.ciphertext)?;
    Ok(ReceivedMessage {
        envelope,
        plaintext: Zeroizing::new(plaintext),
    })
}

/// Fetch the envelope at `address` and open it as `local_identity`
pub async fn receive_message<C>(
    store: &C,
    address: &ContentAddress,
    local_identity: &str,
    context: &str,
) -> Result<ReceivedMessage, MessagingError>
where
    C: ContentStore + ?Sized,
{
    let bytes = store.get(address).await?;
    let received = open_envelope(&bytes, local_identity, context)?;
    log::info!(
        "Received {:?} message from {}",
        received.envelope.message_type,
        received.envelope.sender_address
    );
    Ok(received)
}
