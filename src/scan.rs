//! Base64 run extraction from noisy text.
//!
//! The input file may contain arbitrary text, log prefixes or outright
//! binary garbage around the base64 codes. [`RunScanner`] walks the stream
//! byte by byte, collecting maximal runs of base64-alphabet characters
//! (URL-safe aliases are normalized on the fly) and classifying each run
//! once it terminates. Only runs that pass the length and alignment checks
//! are handed on for decoding; everything else is skipped and the scan
//! continues with the next candidate.
//!
//! A signed balance counter between valid and invalid characters guards
//! against scanning files that are not text at all (zip, ISO, executables):
//! once the balance drops below the abort threshold the whole scan stops.

use std::io::BufRead;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, warn};

use crate::error::{DecodeError, ScanError};
use crate::limits::{GROW_STEP, INIT_BUF_LEN, MAX_BASE64_LEN, MIN_BASE64_LEN};

/// Scan abort threshold for the valid/invalid character balance.
const BALANCE_ABORT: i32 = -100;

/// Growable byte buffer with an explicit growth step and hard capacity cap.
///
/// Mirrors the bounded-growth policy of the scratch buffers: capacity starts
/// small, grows in fixed increments on demand and never exceeds the cap.
/// `push` reports whether the byte was stored, so callers can keep counting
/// characters past the cap without storing them.
#[derive(Debug)]
pub struct BoundedBuf {
    data: Vec<u8>,
    step: usize,
    limit: usize,
}

impl BoundedBuf {
    /// Create a buffer with `initial` capacity, growing by `step` up to `limit`.
    pub fn new(initial: usize, step: usize, limit: usize) -> Self {
        Self {
            data: Vec::with_capacity(initial.min(limit)),
            step,
            limit,
        }
    }

    /// Append a byte, growing the buffer if needed. Returns `false` when the
    /// buffer is already at its capacity cap and the byte was not stored.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.data.len() == self.data.capacity() {
            if self.data.capacity() >= self.limit {
                return false;
            }
            let target = (self.data.capacity() + self.step).min(self.limit);
            self.data.reserve_exact(target - self.data.len());
        }
        self.data.push(byte);
        true
    }

    /// Forget the contents but keep the capacity for the next run.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

/// Verdict over a terminated run of base64 characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunValidity {
    /// Shorter than the smallest serialized context; common noise, skipped
    /// silently.
    TooShort,
    /// Longer than the run buffer could store.
    TooLong,
    /// Character count is not a multiple of 4.
    BadAlignment,
    /// Worth decoding.
    Valid,
}

impl RunValidity {
    /// Classify a run from its counted length and the number of bytes that
    /// were actually stored. `counted > stored` means the buffer cap was hit.
    pub fn classify(counted: usize, stored: usize) -> Self {
        if counted < MIN_BASE64_LEN {
            RunValidity::TooShort
        } else if counted > stored {
            RunValidity::TooLong
        } else if counted % 4 != 0 {
            RunValidity::BadAlignment
        } else {
            RunValidity::Valid
        }
    }
}

/// One accepted base64 run, borrowed from the scanner's run buffer.
#[derive(Debug)]
pub struct CandidateRun<'a> {
    /// Run characters, already normalized to the standard alphabet.
    pub bytes: &'a [u8],
}

impl CandidateRun<'_> {
    /// Number of base64 characters in the run.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decode the run into `out`. `out` is cleared first and reused across
    /// blobs; its capacity is never shrunk.
    pub fn decode_into(&self, out: &mut Vec<u8>) -> Result<(), DecodeError> {
        out.clear();
        STANDARD.decode_vec(self.bytes, out)?;
        Ok(())
    }
}

/// Byte classification outcome while a run is being collected.
///
/// `pad` tracks the `=` padding state machine: 0 outside padding, 1 after
/// the first `=`, 2 after the second. While in a padding state only a second
/// `=` can extend the run.
fn classify_byte(byte: u8, pad: u8) -> Option<(u8, u8)> {
    if pad > 0 {
        if byte == b'=' && pad == 1 {
            return Some((b'=', 2));
        }
        return None;
    }
    match byte {
        b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'+' | b'/' => Some((byte, pad)),
        b'=' => Some((b'=', 1)),
        // URL-safe aliases are stored in standard-alphabet form.
        b'-' => Some((b'+', pad)),
        b'_' => Some((b'/', pad)),
        _ => None,
    }
}

/// Scanner yielding one candidate base64 run at a time.
pub struct RunScanner<R> {
    reader: R,
    buf: BoundedBuf,
    /// Characters seen in the current run, including any not stored.
    run_len: usize,
    pad: u8,
    balance: i32,
}

impl<R: BufRead> RunScanner<R> {
    /// Scan `reader` with the default run buffer sizing.
    pub fn new(reader: R) -> Self {
        Self::with_buffer(reader, BoundedBuf::new(INIT_BUF_LEN, GROW_STEP, MAX_BASE64_LEN))
    }

    /// Scan with a caller-sized run buffer. Used by tests to exercise the
    /// capacity cap without multi-megabyte inputs.
    pub fn with_buffer(reader: R, buf: BoundedBuf) -> Self {
        Self {
            reader,
            buf,
            run_len: 0,
            pad: 0,
            balance: 0,
        }
    }

    fn next_byte(&mut self) -> std::io::Result<Option<u8>> {
        let chunk = self.reader.fill_buf()?;
        if chunk.is_empty() {
            return Ok(None);
        }
        let byte = chunk[0];
        self.reader.consume(1);
        Ok(Some(byte))
    }

    fn reset_run(&mut self) {
        self.buf.clear();
        self.run_len = 0;
        self.pad = 0;
    }

    /// Return the next run that passes the length and alignment checks, or
    /// `None` once the stream is exhausted.
    ///
    /// # Errors
    ///
    /// [`ScanError::TooManyBadSymbols`] when the input looks like a binary
    /// file, or [`ScanError::Io`] on a read failure. Both abort the scan.
    pub fn next_run(&mut self) -> Result<Option<CandidateRun<'_>>, ScanError> {
        self.reset_run();

        loop {
            let byte = self.next_byte()?;
            let class = byte.and_then(|b| classify_byte(b, self.pad));

            match class {
                Some((normalized, pad)) => {
                    self.balance += 1;
                    self.pad = pad;
                    self.run_len += 1;
                    // Past the cap the byte is counted but not stored, so
                    // the eventual run length is still reported accurately.
                    let _stored = self.buf.push(normalized);
                }
                None => {
                    self.balance -= 1;
                    if self.run_len > 0 {
                        match RunValidity::classify(self.run_len, self.buf.len()) {
                            RunValidity::Valid => {
                                return Ok(Some(CandidateRun {
                                    bytes: self.buf.as_slice(),
                                }));
                            }
                            RunValidity::TooShort => {
                                debug!(
                                    len = self.run_len,
                                    "code found is too small to be an SSL context"
                                );
                            }
                            RunValidity::TooLong => {
                                warn!(
                                    excess = self.run_len - self.buf.len(),
                                    "code found is too large, skipping"
                                );
                            }
                            RunValidity::BadAlignment => {
                                warn!(
                                    len = self.run_len,
                                    "base64 code length should be a multiple of 4, skipping"
                                );
                            }
                        }
                        self.reset_run();
                    }
                }
            }

            if self.balance < BALANCE_ABORT {
                return Err(ScanError::TooManyBadSymbols);
            }

            if byte.is_none() {
                return Ok(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    /// A syntactically valid run: long enough and 4-aligned.
    fn valid_run() -> String {
        "A".repeat(232)
    }

    fn scan_all(input: &[u8]) -> Vec<Vec<u8>> {
        let mut scanner = RunScanner::new(Cursor::new(input.to_vec()));
        let mut runs = Vec::new();
        while let Some(run) = scanner.next_run().unwrap() {
            runs.push(run.bytes.to_vec());
        }
        runs
    }

    #[test]
    fn plain_text_yields_no_runs() {
        assert!(scan_all(b"not base64 at all !!!").is_empty());
    }

    #[test]
    fn extracts_run_between_noise() {
        let input = format!("prelude text\n{}\ntrailing", valid_run());
        let runs = scan_all(input.as_bytes());
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].len(), 232);
    }

    #[test]
    fn run_at_end_of_stream_is_returned() {
        let runs = scan_all(valid_run().as_bytes());
        assert_eq!(runs.len(), 1);
    }

    #[test]
    fn url_safe_aliases_are_normalized() {
        let input = format!("{}-_", "B".repeat(230));
        let runs = scan_all(input.as_bytes());
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0][230], b'+');
        assert_eq!(runs[0][231], b'/');
    }

    #[test]
    fn short_run_is_skipped() {
        // 228 < MIN_BASE64_LEN, even though 4-aligned.
        let runs = scan_all("C".repeat(228).as_bytes());
        assert!(runs.is_empty());
    }

    #[test]
    fn misaligned_run_is_skipped() {
        let runs = scan_all("D".repeat(233).as_bytes());
        assert!(runs.is_empty());
    }

    #[test]
    fn double_padding_extends_run() {
        let input = format!("{}==", "E".repeat(230));
        let runs = scan_all(input.as_bytes());
        assert_eq!(runs.len(), 1);
        assert_eq!(&runs[0][230..], b"==");
    }

    #[test]
    fn character_after_padding_terminates_run() {
        // "=A" after 231 chars: the 'A' ends the run at 232 characters,
        // then starts a fresh (too short) run of its own.
        let input = format!("{}=A", "F".repeat(231));
        let runs = scan_all(input.as_bytes());
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].len(), 232);
    }

    #[test]
    fn two_runs_in_one_file() {
        let input = format!("{}\n...\n{}", valid_run(), "G".repeat(236));
        let runs = scan_all(input.as_bytes());
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[1].len(), 236);
    }

    #[test]
    fn binary_input_aborts_the_scan() {
        let input: Vec<u8> = (0..200u8).map(|i| if i % 2 == 0 { 0x00 } else { 0x01 }).collect();
        let mut scanner = RunScanner::new(Cursor::new(input));
        match scanner.next_run() {
            Err(ScanError::TooManyBadSymbols) => {}
            other => panic!("expected TooManyBadSymbols, got {other:?}"),
        }
    }

    #[test]
    fn overlong_run_is_rejected_not_truncated() {
        // Cap the buffer at 240 bytes; feed 244 characters. The run must be
        // classified TooLong and skipped, not silently cut down to 240.
        let input = format!("{}\n{}", "H".repeat(244), valid_run());
        let buf = BoundedBuf::new(16, 16, 240);
        let mut scanner = RunScanner::with_buffer(Cursor::new(input.into_bytes()), buf);
        let first = scanner.next_run().unwrap().expect("second run survives");
        assert_eq!(first.len(), 232);
        assert!(scanner.next_run().unwrap().is_none());
    }

    #[test]
    fn bounded_buf_grows_in_steps_up_to_limit() {
        let mut buf = BoundedBuf::new(4, 4, 10);
        for i in 0..10u8 {
            assert!(buf.push(i), "byte {i} should fit");
        }
        assert!(!buf.push(0xff));
        assert_eq!(buf.len(), 10);
        buf.clear();
        assert!(buf.is_empty());
        assert!(buf.push(1));
    }

    #[test]
    fn decode_reuses_output_buffer() {
        let encoded = STANDARD.encode([0xde, 0xad, 0xbe, 0xef]);
        let run = CandidateRun {
            bytes: encoded.as_bytes(),
        };
        let mut out = vec![0u8; 64];
        run.decode_into(&mut out).unwrap();
        assert_eq!(out, [0xde, 0xad, 0xbe, 0xef]);
    }
}
