#![no_main]

use libfuzzer_sys::fuzz_target;
use shardmail_core::crypto::PasswordBlob;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes either parse or return Err, never panic
    if let Ok(blob) = PasswordBlob::from_bytes(data) {
        let bytes = blob.to_bytes();
        assert_eq!(bytes.as_slice(), data);
        let _ = PasswordBlob::from_bytes(&bytes);
    }
});
