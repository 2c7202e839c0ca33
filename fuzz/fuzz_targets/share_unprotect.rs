#![no_main]

use libfuzzer_sys::fuzz_target;
use shardmail_shamir::{unprotect_bytes, EncryptedShare};

fuzz_target!(|data: &[u8]| {
    // Forged share blobs must fail cleanly. PBKDF2 only runs once the
    // blob is long enough to hold salt, nonce and tag.
    let _ = EncryptedShare::from_bytes(data);
    let _ = unprotect_bytes(data, "fuzz");
});
