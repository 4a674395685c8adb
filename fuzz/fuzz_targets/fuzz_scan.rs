//! Fuzz target for the whole pipeline: scan arbitrary bytes for base64
//! runs, decode and parse whatever comes out. Must never panic or read out
//! of bounds; the bad-symbol heuristic and blob-local errors are both fine.

#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use ssl_context_info::{RuntimeConfig, ScanSession};

fuzz_target!(|data: &[u8]| {
    let mut session = ScanSession::new(RuntimeConfig::default());
    let mut sink = Vec::new();
    let _ = session.process(Cursor::new(data.to_vec()), &mut sink);
});
