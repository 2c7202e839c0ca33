//! Security-specific tests.
//!
//! These tests verify:
//! 1. Password-protected shares reject wrong passwords and tampering
//! 2. Message ciphertexts reject wrong keys and tampering
//! 3. Envelopes are only opened by their recipient
//! 4. Malformed inputs don't panic
//! 5. Field arithmetic rejects undefined operations

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use shardmail_core::cipher::{decrypt, encrypt, Iv};
use shardmail_core::crypto::{open_with_password, seal_with_password, PasswordBlob};
use shardmail_core::field::{mod_inverse, prime, FieldElement, FieldError};
use shardmail_core::kdf::{derive_session_key, DEFAULT_CONTEXT};
use shardmail_core::CryptoError;
use shardmail_messaging::{
    open_envelope, send_message, InMemoryContentStore, InMemoryLedger, MessageEnvelope,
    MessageType, MessagingError, OutboundMessage, PublicKeyDirectory,
};
use shardmail_shamir::{
    protect, reconstruct, split, unprotect, unprotect_bytes, EncryptedShare, Secret, ShamirError,
    Share,
};
use std::num::NonZeroU8;

// ============================================================================
// 1. Share Protection
// ============================================================================

fn sample_share() -> Share {
    Share::new(
        NonZeroU8::new(3).unwrap(),
        FieldElement::from_u64(0xdead_beef),
    )
}

#[test]
fn test_wrong_password_fails_unprotect() {
    let encrypted = protect(&sample_share(), "correct horse battery staple").unwrap();
    let result = unprotect(&encrypted, "wrong horse battery staple");
    assert_eq!(result, Err(CryptoError::AuthenticationFailed));
}

#[test]
fn test_empty_password_is_still_a_password() {
    let encrypted = protect(&sample_share(), "").unwrap();
    assert!(unprotect(&encrypted, "notempty").is_err());
    assert_eq!(unprotect(&encrypted, "").unwrap(), sample_share());
}

#[test]
fn test_tampering_any_region_fails_unprotect() {
    let bytes = protect(&sample_share(), "pw").unwrap().to_bytes();

    // salt, nonce, ciphertext body, tag
    for &position in &[0usize, 16, 28, bytes.len() - 1] {
        let mut tampered = bytes.clone();
        tampered[position] ^= 0xFF;
        assert_eq!(
            unprotect_bytes(&tampered, "pw"),
            Err(CryptoError::AuthenticationFailed),
            "tampering byte {} was not detected",
            position
        );
    }
}

#[test]
fn test_truncated_share_blob_rejected() {
    let bytes = protect(&sample_share(), "pw").unwrap().to_bytes();
    assert_eq!(
        EncryptedShare::from_bytes(&bytes[..43]).unwrap_err(),
        CryptoError::InvalidFormat
    );
    assert!(unprotect_bytes(&bytes[..bytes.len() - 1], "pw").is_err());
}

#[test]
fn test_sealed_non_share_payload_rejected() {
    // Authentic ciphertext whose plaintext is not a share
    let blob = seal_with_password(b"not a share", "pw").unwrap();
    assert_eq!(
        unprotect_bytes(&blob.to_bytes(), "pw"),
        Err(CryptoError::InvalidFormat)
    );
    assert_eq!(
        open_with_password(&blob, "pw").unwrap().as_slice(),
        b"not a share"
    );
}

#[test]
fn test_protect_uses_fresh_salt_and_nonce() {
    let a = protect(&sample_share(), "pw").unwrap().to_bytes();
    let b = protect(&sample_share(), "pw").unwrap().to_bytes();
    assert_ne!(a[..16], b[..16], "salt reused");
    assert_ne!(a[16..28], b[16..28], "nonce reused");
}

// ============================================================================
// 2. Message Encryption
// ============================================================================

#[test]
fn test_wrong_session_key_fails_decryption() {
    let key = derive_session_key("0xkey-a", DEFAULT_CONTEXT);
    let other = derive_session_key("0xkey-b", DEFAULT_CONTEXT);

    let sealed = encrypt(&key, Iv::random(), b"attack at dawn").unwrap();
    assert_eq!(
        decrypt(&other, &sealed.iv, &sealed.ciphertext),
        Err(CryptoError::AuthenticationFailed)
    );
    assert_eq!(
        decrypt(&key, &sealed.iv, &sealed.ciphertext).unwrap(),
        b"attack at dawn"
    );
}

#[test]
fn test_flipped_bits_fail_decryption() {
    let key = derive_session_key("0xkey", DEFAULT_CONTEXT);
    let sealed = encrypt(&key, Iv::random(), b"attack at dawn").unwrap();

    for position in 0..sealed.ciphertext.len() {
        let mut tampered = sealed.ciphertext.clone();
        tampered[position] ^= 0x01;
        assert!(decrypt(&key, &sealed.iv, &tampered).is_err());
    }

    let mut iv = sealed.iv;
    iv[0] ^= 0x01;
    assert!(decrypt(&key, &iv, &sealed.ciphertext).is_err());

    // Tag alone, or less
    assert!(decrypt(&key, &sealed.iv, &sealed.ciphertext[..16]).is_err());
    assert!(decrypt(&key, &sealed.iv, &[]).is_err());
}

// ============================================================================
// 3. Envelope Authorization
// ============================================================================

const ALICE: &str = "0xAAaaAAaaAAaaAAaaAAaaAAaaAAaaAAaaAAaaAAaa";
const BOB: &str = "0xBBbbBBbbBBbbBBbbBBbbBBbbBBbbBBbbBBbbBBbb";
const MALLORY: &str = "0xCCccCCccCCccCCccCCccCCccCCccCCccCCccCCcc";

async fn envelope_for_bob(body: &[u8]) -> MessageEnvelope {
    let ledger = InMemoryLedger::new();
    ledger.register_public_key(BOB, &[0x02; 33]).await.unwrap();
    let store = InMemoryContentStore::new();

    send_message(
        &ledger,
        &store,
        OutboundMessage::new(ALICE, "alice", BOB, MessageType::Text),
        DEFAULT_CONTEXT,
        body,
    )
    .await
    .unwrap()
    .envelope
}

#[tokio::test]
async fn test_non_recipient_is_rejected_before_decryption() {
    let envelope = envelope_for_bob(b"hello bob").await;
    let bytes = envelope.encode().unwrap();

    for identity in [ALICE, MALLORY, "", "0xBB"] {
        assert!(
            matches!(
                open_envelope(&bytes, identity, DEFAULT_CONTEXT),
                Err(MessagingError::Unauthorized { .. })
            ),
            "{} opened an envelope for {}",
            identity,
            BOB
        );
    }
    assert!(open_envelope(&bytes, BOB, DEFAULT_CONTEXT).is_ok());
}

#[tokio::test]
async fn test_readdressed_envelope_fails_authentication() {
    // Rewriting the recipient and key_id gets past the address check
    // but not the tag
    let mut envelope = envelope_for_bob(b"hello bob").await;
    envelope.recipient_address = MALLORY.to_string();
    envelope.key_id = "0x00".to_string();
    let bytes = envelope.encode().unwrap();

    assert_eq!(
        open_envelope(&bytes, MALLORY, DEFAULT_CONTEXT).unwrap_err(),
        MessagingError::Crypto(CryptoError::AuthenticationFailed)
    );
}

// ============================================================================
// 4. Malformed Input Fuzzing
// ============================================================================

#[test]
fn test_random_bytes_never_panic_as_shares() {
    let mut rng = ChaCha20Rng::seed_from_u64(0xf022);

    // Short inputs are rejected before any key derivation
    for len in 0..44 {
        let mut data = vec![0u8; len];
        rng.fill_bytes(&mut data);
        assert_eq!(
            unprotect_bytes(&data, "pw"),
            Err(CryptoError::InvalidFormat)
        );
    }

    // Full-size inputs go through PBKDF2, so keep the count small
    for _ in 0..4 {
        let len = rng.gen_range(44..200);
        let mut data = vec![0u8; len];
        rng.fill_bytes(&mut data);
        assert!(unprotect_bytes(&data, "pw").is_err());
        assert!(PasswordBlob::from_bytes(&data).is_ok());
    }
}

#[test]
fn test_random_bytes_never_panic_as_envelopes() {
    let mut rng = ChaCha20Rng::seed_from_u64(0xe11);
    for _ in 0..500 {
        let len = rng.gen_range(0..256);
        let mut data = vec![0u8; len];
        rng.fill_bytes(&mut data);
        assert!(MessageEnvelope::decode(&data, BOB).is_err());
    }

    let inputs: &[&[u8]] = &[
        b"",
        b"{}",
        b"null",
        b"[]",
        b"{\"key_id\": 5}",
        b"{\"recipient_address\": \"0xbb\"}",
        &[0xff, 0xfe, 0x00],
    ];
    for input in inputs {
        assert!(matches!(
            MessageEnvelope::decode(input, BOB),
            Err(MessagingError::InvalidEnvelope(_))
        ));
    }
}

#[test]
fn test_malformed_share_json_rejected() {
    let bad: &[&str] = &[
        r#"{"x":0,"y":"1"}"#,
        r#"{"x":256,"y":"1"}"#,
        r#"{"x":1,"y":"-1"}"#,
        r#"{"x":1,"y":"0x10"}"#,
        r#"{"x":1}"#,
    ];
    for json in bad {
        assert!(serde_json::from_str::<Share>(json).is_err(), "{}", json);
    }

    // y must be a canonical field element
    let p = prime().to_string();
    let json = format!(r#"{{"x":1,"y":"{}"}}"#, p);
    assert!(serde_json::from_str::<Share>(&json).is_err());
}

// ============================================================================
// 5. Arithmetic Edge Cases
// ============================================================================

#[test]
fn test_zero_has_no_inverse() {
    assert_eq!(
        FieldElement::zero().inverse(),
        Err(FieldError::NotInvertible)
    );
    assert_eq!(
        mod_inverse(prime(), prime()),
        Err(FieldError::NotInvertible)
    );
}

#[test]
fn test_duplicate_share_index_is_arithmetic_error() {
    let shares = split(&Secret::new(vec![7u8; 32]), 3, 2).unwrap();
    let duplicated = [shares[0].clone(), shares[0].clone()];
    assert!(matches!(
        reconstruct(&duplicated, 32),
        Err(ShamirError::Arithmetic(_))
    ));
}

#[test]
fn test_oversized_secrets_rejected() {
    assert!(matches!(
        split(&Secret::new(vec![1u8; 33]), 3, 2),
        Err(ShamirError::InvalidParameters(_))
    ));
    // 32 bytes of 0xff is above the prime
    assert!(matches!(
        split(&Secret::new(vec![0xffu8; 32]), 3, 2),
        Err(ShamirError::InvalidParameters(_))
    ));
    assert!(matches!(
        split(&Secret::new(vec![1u8; 32]), 2, 3),
        Err(ShamirError::InvalidParameters(_))
    ));
}

#[test]
fn test_secret_debug_does_not_leak() {
    let secret = Secret::new(vec![0x5a; 32]);
    let printed = format!("{:?}", secret);
    assert!(!printed.contains("5a"));
    assert!(!printed.contains("90"));

    let key = derive_session_key("0xkey", DEFAULT_CONTEXT);
    assert_eq!(format!("{:?}", key), "SessionKey(..)");
}
