//! Peer certificate decoding.
//!
//! Certificates embedded in a serialized context are opaque DER blobs as far
//! as the wire format is concerned. They are handed to `x509-parser` and
//! summarized into a [`CertInfo`]; a failed parse is reported, not fatal,
//! and the caller keeps the raw bytes so they can still be shown as hex.

use x509_parser::prelude::*;

use crate::error::{DecodeError, Result};

/// Summary of an X.509 certificate recovered from a blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertInfo {
    /// X.509 version (0-based on the wire: 2 means v3).
    pub version: u32,
    pub serial: String,
    pub subject: String,
    pub issuer: String,
    pub not_before: String,
    pub not_after: String,
    /// Signature algorithm OID in dotted form.
    pub signature_algorithm: String,
}

/// Decode a single DER-encoded certificate.
///
/// # Errors
///
/// [`DecodeError::Malformed`] when the bytes are not a well-formed X.509
/// certificate or when trailing bytes follow it.
pub fn decode_certificate(der: &[u8]) -> Result<CertInfo> {
    let (rest, cert) =
        X509Certificate::from_der(der).map_err(|e| DecodeError::Malformed {
            field: "certificate",
            reason: e.to_string(),
        })?;

    if !rest.is_empty() {
        return Err(DecodeError::Malformed {
            field: "certificate",
            reason: format!("{} trailing bytes after DER structure", rest.len()),
        });
    }

    Ok(CertInfo {
        version: cert.version().0,
        serial: cert.raw_serial_as_string(),
        subject: cert.subject().to_string(),
        issuer: cert.issuer().to_string(),
        not_before: cert.validity().not_before.to_string(),
        not_after: cert.validity().not_after.to_string(),
        signature_algorithm: cert.signature_algorithm.algorithm.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_is_malformed_not_panic() {
        let err = decode_certificate(&[0xde, 0xad, 0xbe, 0xef]).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { field: "certificate", .. }));
    }

    #[test]
    fn empty_input_is_malformed() {
        assert!(decode_certificate(&[]).is_err());
    }

    #[test]
    fn truncated_der_sequence_is_malformed() {
        // Outer SEQUENCE header declaring more content than present.
        assert!(decode_certificate(&[0x30, 0x82, 0x10, 0x00, 0x01]).is_err());
    }
}
