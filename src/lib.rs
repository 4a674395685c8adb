//! ssl-context-info - recover and inspect serialized Mbed TLS SSL contexts.
//!
//! A serialized context (the output of `mbedtls_ssl_context_save()`) is
//! often shipped around base64-encoded inside logs or support bundles. This
//! crate scans a text file for embedded base64 runs, decodes them and parses
//! the fixed binary layout of the context and its nested session record into
//! structured, typed reports.
//!
//! The pipeline has two layers with very different tolerance levels:
//!
//! - a lenient scanner ([`scan::RunScanner`]) that recovers base64 runs from
//!   arbitrary surrounding noise, and
//! - a strict, bounds-checked binary parser ([`context::decode_context`])
//!   that never reads past the blob a run decoded to.
//!
//! # Example
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! use ssl_context_info::{RuntimeConfig, ScanSession};
//!
//! fn main() -> anyhow::Result<()> {
//!     let file = File::open("dump.txt")?;
//!     let mut session = ScanSession::new(RuntimeConfig::default());
//!     let summary = session.process(BufReader::new(file), &mut std::io::stdout())?;
//!     println!("decoded {} of {} codes", summary.decoded, summary.runs_found);
//!     Ok(())
//! }
//! ```

pub mod cert;
pub mod cli;
pub mod config;
pub mod context;
pub mod cursor;
pub mod error;
pub mod inspect;
pub mod limits;
pub mod report;
pub mod scan;
pub mod session;

pub use config::RuntimeConfig;
pub use context::{decode_context, ParsedContext};
pub use cursor::ByteCursor;
pub use error::{DecodeError, Result, ScanError};
pub use inspect::{ScanSession, ScanSummary};
pub use scan::{CandidateRun, RunScanner, RunValidity};
pub use session::{decode_session, ParsedSession};
