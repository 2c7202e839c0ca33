#![no_main]

use libfuzzer_sys::fuzz_target;
use shardmail_messaging::MessageEnvelope;

fuzz_target!(|data: &[u8]| {
    let recipient = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    // Decoding never panics, and anything accepted re-encodes and decodes
    if let Ok(envelope) = MessageEnvelope::decode(data, recipient) {
        let bytes = envelope.encode().unwrap();
        let again = MessageEnvelope::decode(&bytes, recipient).unwrap();
        assert_eq!(again, envelope);
    }
});
