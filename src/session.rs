//! Session sub-record decoder.
//!
//! The session is an embedded record inside the serialized context,
//! carrying the resumable-session state: timestamp, ciphersuite,
//! session ID, master secret, verify result, and a set of optional field
//! groups gated by the session config flags recorded in the outer context
//! header.
//!
//! Wire layout (all multi-byte fields big-endian, optional groups noted):
//!
//! ```text
//! uint64 start_time;            // if TIME flag
//! uint8  ciphersuite[2];
//! uint8  compression;           // 0 or 1
//! uint8  session_id_len;        // nominal; 32 bytes always follow
//! opaque session_id[32];
//! opaque master[48];
//! uint32 verify_result;
//! opaque peer_cert<0..2^24-1>;  // if CERTIFICATE flag; digest form when the
//!                               // producing build did not keep certificates
//! opaque ticket<0..2^24-1>;     // if CLIENT_TICKET flag
//! uint32 ticket_lifetime;       // if CLIENT_TICKET flag
//! uint8  mfl_code;              // if MFL flag
//! uint8  trunc_hmac;            // if TRUNCATED_HMAC flag
//! uint8  encrypt_then_mac;      // if ENCRYPT_THEN_MAC flag
//! ```

use tls_parser::TlsCipherSuite;
use tracing::debug;

use crate::cert::{self, CertInfo};
use crate::config::RuntimeConfig;
use crate::cursor::ByteCursor;
use crate::error::{DecodeError, Result};

/// Session config flag bits (16-bit field in the context header).
pub mod session_flags {
    pub const TIME: u16 = 1 << 0;
    pub const CERTIFICATE: u16 = 1 << 1;
    pub const CLIENT_TICKET: u16 = 1 << 2;
    pub const MFL: u16 = 1 << 3;
    pub const TRUNCATED_HMAC: u16 = 1 << 4;
    pub const ENCRYPT_THEN_MAC: u16 = 1 << 5;
    pub const TICKETS: u16 = 1 << 6;
}

/// Ciphersuite ID with its registry name, when the ID resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ciphersuite {
    pub id: u16,
    /// `None` when the ID is not in the IANA registry; reported, not fatal.
    pub name: Option<&'static str>,
}

impl Ciphersuite {
    pub fn from_id(id: u16) -> Self {
        Self {
            id,
            name: TlsCipherSuite::from_id(id).map(|s| s.name),
        }
    }
}

/// Digest algorithm tag used for the peer-certificate digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    None,
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Ripemd160,
    /// Tag byte outside the known range.
    Unknown(u8),
}

impl DigestAlgorithm {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0 => DigestAlgorithm::None,
            3 => DigestAlgorithm::Md5,
            4 => DigestAlgorithm::Sha1,
            5 => DigestAlgorithm::Sha224,
            6 => DigestAlgorithm::Sha256,
            7 => DigestAlgorithm::Sha384,
            8 => DigestAlgorithm::Sha512,
            9 => DigestAlgorithm::Ripemd160,
            other => DigestAlgorithm::Unknown(other),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::None => "none",
            DigestAlgorithm::Md5 => "MD5",
            DigestAlgorithm::Sha1 => "SHA1",
            DigestAlgorithm::Sha224 => "SHA224",
            DigestAlgorithm::Sha256 => "SHA256",
            DigestAlgorithm::Sha384 => "SHA384",
            DigestAlgorithm::Sha512 => "SHA512",
            DigestAlgorithm::Ripemd160 => "RIPEMD160",
            DigestAlgorithm::Unknown(_) => "undefined or erroneous",
        }
    }
}

/// Peer certificate material, in whichever form the producing build stored it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerCertificate {
    /// Certificate flag set but zero-length certificate.
    Absent,
    /// Stored verbatim and successfully decoded.
    Parsed(CertInfo),
    /// Stored verbatim but not decodable as X.509; raw bytes kept for display.
    Unparsable { der: Vec<u8>, reason: String },
    /// Stored as a digest only.
    Digest {
        algorithm: DigestAlgorithm,
        digest: Vec<u8>,
    },
}

/// Session ticket with its advertised lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTicket {
    pub data: Vec<u8>,
    pub lifetime_secs: u32,
}

/// Negotiated maximum fragment length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxFragmentLength {
    None,
    Mfl512,
    Mfl1024,
    Mfl2048,
    Mfl4096,
}

impl MaxFragmentLength {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(MaxFragmentLength::None),
            1 => Some(MaxFragmentLength::Mfl512),
            2 => Some(MaxFragmentLength::Mfl1024),
            3 => Some(MaxFragmentLength::Mfl2048),
            4 => Some(MaxFragmentLength::Mfl4096),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MaxFragmentLength::None => "none",
            MaxFragmentLength::Mfl512 => "512",
            MaxFragmentLength::Mfl1024 => "1024",
            MaxFragmentLength::Mfl2048 => "2048",
            MaxFragmentLength::Mfl4096 => "4096",
        }
    }
}

/// Fully decoded session sub-record. Optional fields are `None` when their
/// gating flag was not set; they are never fabricated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSession {
    pub start_time: Option<u64>,
    pub ciphersuite: Ciphersuite,
    pub compression: u8,
    /// Nominal length byte preceding the session ID. The format always
    /// reserves 32 bytes for the ID regardless of this value, so it is
    /// informational only and must not be used to size the read.
    pub session_id_nominal_len: u8,
    pub session_id: [u8; 32],
    pub master_secret: [u8; 48],
    pub verify_result: u32,
    pub peer_certificate: Option<PeerCertificate>,
    pub ticket: Option<SessionTicket>,
    pub max_fragment_length: Option<MaxFragmentLength>,
    pub truncated_hmac: Option<bool>,
    pub encrypt_then_mac: Option<bool>,
    /// Bytes left over inside the declared session span. Non-fatal anomaly.
    pub trailing: usize,
}

/// Decode the session sub-record from `cursor`, which must span exactly the
/// `session_len` bytes declared by the outer context.
pub fn decode_session(
    cursor: &mut ByteCursor<'_>,
    flags: u16,
    cfg: &RuntimeConfig,
) -> Result<ParsedSession> {
    let start_time = if flags & session_flags::TIME != 0 {
        Some(cursor.read_u64_be()?)
    } else {
        None
    };

    let ciphersuite_id = cursor.read_u16_be()?;
    debug!(id = ciphersuite_id, "ciphersuite");
    let ciphersuite = Ciphersuite::from_id(ciphersuite_id);

    let compression = cursor.read_u8()?;

    // The format stores a nominal ID length but always reserves 32 bytes.
    let session_id_nominal_len = cursor.read_u8()?;
    debug!(len = session_id_nominal_len, "session id length");
    let mut session_id = [0u8; 32];
    session_id.copy_from_slice(cursor.take(32)?);

    let mut master_secret = [0u8; 48];
    master_secret.copy_from_slice(cursor.take(48)?);

    let verify_result = cursor.read_u32_be()?;

    let peer_certificate = if flags & session_flags::CERTIFICATE != 0 {
        Some(decode_peer_certificate(cursor, cfg)?)
    } else {
        None
    };

    let ticket = if flags & session_flags::CLIENT_TICKET != 0 {
        let ticket_len = cursor.read_u24_be()? as usize;
        debug!(len = ticket_len, "ticket");
        let data = cursor.take(ticket_len)?.to_vec();
        let lifetime_secs = cursor.read_u32_be()?;
        Some(SessionTicket {
            data,
            lifetime_secs,
        })
    } else {
        None
    };

    let max_fragment_length = if flags & session_flags::MFL != 0 {
        let code = cursor.read_u8()?;
        Some(MaxFragmentLength::from_code(code).ok_or_else(|| {
            DecodeError::Malformed {
                field: "max fragment length",
                reason: format!("unknown MFL code {code}"),
            }
        })?)
    } else {
        None
    };

    let truncated_hmac = if flags & session_flags::TRUNCATED_HMAC != 0 {
        Some(cursor.read_u8()? != 0)
    } else {
        None
    };

    let encrypt_then_mac = if flags & session_flags::ENCRYPT_THEN_MAC != 0 {
        Some(cursor.read_u8()? != 0)
    } else {
        None
    };

    Ok(ParsedSession {
        start_time,
        ciphersuite,
        compression,
        session_id_nominal_len,
        session_id,
        master_secret,
        verify_result,
        peer_certificate,
        ticket,
        max_fragment_length,
        truncated_hmac,
        encrypt_then_mac,
        trailing: cursor.remaining(),
    })
}

fn decode_peer_certificate(
    cursor: &mut ByteCursor<'_>,
    cfg: &RuntimeConfig,
) -> Result<PeerCertificate> {
    if cfg.keep_peer_certificate {
        let cert_len = cursor.read_u24_be()? as usize;
        debug!(len = cert_len, "certificate");
        if cert_len == 0 {
            return Ok(PeerCertificate::Absent);
        }
        let der = cursor.take(cert_len)?;
        match cert::decode_certificate(der) {
            Ok(info) => Ok(PeerCertificate::Parsed(info)),
            Err(e) => Ok(PeerCertificate::Unparsable {
                der: der.to_vec(),
                reason: e.to_string(),
            }),
        }
    } else {
        let algorithm = DigestAlgorithm::from_byte(cursor.read_u8()?);
        let digest_len = cursor.read_u8()? as usize;
        debug!(len = digest_len, "peer digest");
        let digest = cursor.take(digest_len)?.to_vec();
        Ok(PeerCertificate::Digest { algorithm, digest })
    }
}
