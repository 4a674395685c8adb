//! Fuzz target for the raw context decoder, bypassing the base64 layer.
//!
//! The first byte of the input picks the runtime flag combination, so both
//! the certificate and the digest branches and both DTLS settings get
//! exercised.

#![no_main]

use libfuzzer_sys::fuzz_target;
use ssl_context_info::{decode_context, RuntimeConfig};

fuzz_target!(|data: &[u8]| {
    let Some((&selector, blob)) = data.split_first() else {
        return;
    };
    let config = RuntimeConfig {
        keep_peer_certificate: selector & 1 != 0,
        dtls_enabled: selector & 2 != 0,
    };
    let _ = decode_context(blob, &config);
});
