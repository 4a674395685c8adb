//! Scan-and-report driver.
//!
//! [`ScanSession`] owns everything one pass over an input file needs: the
//! runtime configuration and the decode scratch buffer, which is reused
//! across blobs and never shrunk. Each candidate run is decoded, parsed as
//! a context and rendered; every failure is local to its blob and the loop
//! continues with the next run.

use std::io::{BufRead, Write};

use tracing::{debug, error};

use crate::config::RuntimeConfig;
use crate::context::decode_context;
use crate::error::ScanError;
use crate::report::render_context;
use crate::scan::RunScanner;

/// Counters for one pass over an input file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Candidate runs that passed the length and alignment checks.
    pub runs_found: u32,
    /// Blobs decoded all the way to a report.
    pub decoded: u32,
    /// Blobs that failed base64 decoding or context parsing.
    pub failed: u32,
}

/// One scanning pass over a file, with its scratch state.
pub struct ScanSession {
    config: RuntimeConfig,
    blob_buf: Vec<u8>,
}

impl ScanSession {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            blob_buf: Vec::new(),
        }
    }

    /// Scan `reader`, writing one report per successfully decoded blob to
    /// `out`.
    ///
    /// # Errors
    ///
    /// Only scan-level failures abort: an I/O error on either side, or the
    /// bad-symbol heuristic deciding the input is not a text file. Blob
    /// decode failures are counted and logged, never returned.
    pub fn process<R: BufRead, W: Write>(
        &mut self,
        reader: R,
        out: &mut W,
    ) -> Result<ScanSummary, ScanError> {
        let mut scanner = RunScanner::new(reader);
        let mut summary = ScanSummary::default();

        while let Some(run) = scanner.next_run()? {
            summary.runs_found += 1;
            writeln!(out, "\nDeserializing number {}:", summary.runs_found)?;
            debug!(
                len = run.len(),
                code = %String::from_utf8_lossy(run.bytes),
                "base64 code"
            );

            if let Err(e) = run.decode_into(&mut self.blob_buf) {
                summary.failed += 1;
                error!(blob = summary.runs_found, "{e}");
                continue;
            }
            debug!(
                len = self.blob_buf.len(),
                data = %hex_string(&self.blob_buf),
                "decoded blob"
            );

            match decode_context(&self.blob_buf, &self.config) {
                Ok(ctx) => {
                    summary.decoded += 1;
                    render_context(out, &ctx)?;
                }
                Err(e) => {
                    summary.failed += 1;
                    error!(blob = summary.runs_found, "{e}");
                }
            }
        }

        Ok(summary)
    }
}

fn hex_string(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        s.push_str(&format!("{byte:02x}"));
    }
    s
}
