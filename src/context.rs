//! Outer context record decoder.
//!
//! The context is the top-level structure of a decoded blob: a version
//! header, the session and context config flags, the embedded session
//! sub-record, the transform randoms and a trailer of mostly DTLS-related
//! fields. Optional groups are gated either by the context config flags
//! recorded in the blob or, for fields the wire format does not
//! self-describe, by [`RuntimeConfig`].
//!
//! Wire layout (all multi-byte fields big-endian):
//!
//! ```text
//! uint8  version[3];            // serializer version, informational
//! uint16 session_cfg_flags;
//! uint24 context_cfg_flags;
//! uint32 session_len;
//! opaque session<..>;           // see session module
//! uint8  random[64];            // ServerHello.random + ClientHello.random
//! uint8  in_cid_len;  opaque in_cid<..>;    // if DTLS_CONNECTION_ID
//! uint8  out_cid_len; opaque out_cid<..>;   // if DTLS_CONNECTION_ID
//! uint32 badmac_seen;           // if DTLS_BADMAC_LIMIT
//! uint64 in_window_top;         // if DTLS_BADMAC_LIMIT
//! uint64 in_window;             // if DTLS_BADMAC_LIMIT
//! uint8  disable_datagram_packing;  // if the build had DTLS (runtime flag)
//! uint64 cur_out_ctr;
//! uint16 mtu;                   // if the build had DTLS (runtime flag)
//! uint8  alpn_len; opaque alpn<..>;         // if ALPN
//! ```

use tracing::debug;

use crate::config::RuntimeConfig;
use crate::cursor::ByteCursor;
use crate::error::Result;
use crate::limits::TRANSFORM_RANDBYTE_LEN;
use crate::session::{decode_session, session_flags, ParsedSession};

/// Context config flag bits (24-bit field in the header).
pub mod context_flags {
    pub const DTLS_CONNECTION_ID: u32 = 1 << 0;
    pub const DTLS_BADMAC_LIMIT: u32 = 1 << 1;
    /// Informational only; carries no payload bytes.
    pub const DTLS_ANTI_REPLAY: u32 = 1 << 2;
    pub const ALPN: u32 = 1 << 3;
}

/// DTLS connection IDs. An empty ID means none was negotiated in that
/// direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionIds {
    pub incoming: Vec<u8>,
    pub outgoing: Vec<u8>,
}

/// DTLS replay-protection counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayProtection {
    /// Records seen with a failing MAC.
    pub badmac_seen: u32,
    /// Sequence number of the last validated record.
    pub in_window_top: u64,
    /// Replay detection bitmap.
    pub in_window: u64,
}

/// Outcome of the ALPN field group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlpnNegotiation {
    /// ALPN flag set but zero-length protocol name.
    NotNegotiated,
    /// A well-formed protocol name.
    Protocol(String),
    /// The name bytes contain a NUL or are not valid UTF-8. The bytes have
    /// already been consumed, so this does not derail the rest of the record.
    Malformed { bytes: Vec<u8> },
}

/// Fully decoded context record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedContext {
    /// Serializer version triplet (major, minor, patch).
    pub version: (u8, u8, u8),
    pub session_cfg_flags: u16,
    pub context_cfg_flags: u32,
    pub session: ParsedSession,
    pub transform_random: [u8; TRANSFORM_RANDBYTE_LEN],
    pub connection_ids: Option<ConnectionIds>,
    pub replay_protection: Option<ReplayProtection>,
    /// Inverted on the wire: a stored 1 means packing is disabled.
    pub datagram_packing_enabled: Option<bool>,
    /// Outgoing record sequence counter.
    pub out_counter: u64,
    pub mtu: Option<u16>,
    pub alpn: Option<AlpnNegotiation>,
    /// Bytes left over after the last expected field. Non-fatal anomaly.
    pub trailing: usize,
}

/// Human-readable names for the config bits set in a context header.
///
/// The anti-replay bit is informational: it names a feature of the producing
/// build but gates no payload bytes.
pub fn enabled_flag_names(session_cfg: u16, context_cfg: u32) -> Vec<&'static str> {
    let mut names = Vec::new();
    let session_bits = [
        (session_flags::TIME, "session start time"),
        (session_flags::CERTIFICATE, "peer certificate"),
        (session_flags::CLIENT_TICKET, "client session ticket"),
        (session_flags::MFL, "max fragment length"),
        (session_flags::TRUNCATED_HMAC, "truncated HMAC"),
        (session_flags::ENCRYPT_THEN_MAC, "encrypt-then-MAC"),
        (session_flags::TICKETS, "session tickets"),
    ];
    for (bit, name) in session_bits {
        if session_cfg & bit != 0 {
            names.push(name);
        }
    }
    let context_bits = [
        (context_flags::DTLS_CONNECTION_ID, "DTLS connection ID"),
        (context_flags::DTLS_BADMAC_LIMIT, "DTLS bad-MAC limit"),
        (context_flags::DTLS_ANTI_REPLAY, "DTLS anti-replay"),
        (context_flags::ALPN, "ALPN"),
    ];
    for (bit, name) in context_bits {
        if context_cfg & bit != 0 {
            names.push(name);
        }
    }
    names
}

/// Decode one blob as a serialized context.
///
/// # Errors
///
/// [`crate::DecodeError::Truncated`] when any field, including the embedded
/// session span, runs past the end of the blob;
/// [`crate::DecodeError::Malformed`] for structural violations inside the
/// session. Either way decoding of this blob stops; the caller moves on to
/// the next one.
pub fn decode_context(blob: &[u8], cfg: &RuntimeConfig) -> Result<ParsedContext> {
    let mut cursor = ByteCursor::new(blob);

    let header = cursor.take(3)?;
    let version = (header[0], header[1], header[2]);

    let session_cfg_flags = cursor.read_u16_be()?;
    let context_cfg_flags = cursor.read_u24_be()?;
    debug!(
        session = session_cfg_flags,
        context = context_cfg_flags,
        "config flags"
    );

    let session_len = cursor.read_u32_be()? as usize;
    debug!(len = session_len, "session span");
    // Truncation inside the declared span is attributed to the context.
    let session_bytes = cursor.take(session_len)?;
    let mut session_cursor = ByteCursor::new(session_bytes);
    let session = decode_session(&mut session_cursor, session_cfg_flags, cfg)?;

    let mut transform_random = [0u8; TRANSFORM_RANDBYTE_LEN];
    transform_random.copy_from_slice(cursor.take(TRANSFORM_RANDBYTE_LEN)?);

    let connection_ids = if context_cfg_flags & context_flags::DTLS_CONNECTION_ID != 0 {
        let in_len = cursor.read_u8()? as usize;
        debug!(len = in_len, "incoming CID");
        let incoming = cursor.take(in_len)?.to_vec();
        let out_len = cursor.read_u8()? as usize;
        debug!(len = out_len, "outgoing CID");
        let outgoing = cursor.take(out_len)?.to_vec();
        Some(ConnectionIds { incoming, outgoing })
    } else {
        None
    };

    let replay_protection = if context_cfg_flags & context_flags::DTLS_BADMAC_LIMIT != 0 {
        Some(ReplayProtection {
            badmac_seen: cursor.read_u32_be()?,
            in_window_top: cursor.read_u64_be()?,
            in_window: cursor.read_u64_be()?,
        })
    } else {
        None
    };

    let datagram_packing_enabled = if cfg.dtls_enabled {
        // Stored with inverted sense: 1 means packing disabled.
        Some(cursor.read_u8()? == 0)
    } else {
        None
    };

    let out_counter = cursor.read_u64_be()?;

    let mtu = if cfg.dtls_enabled {
        Some(cursor.read_u16_be()?)
    } else {
        None
    };

    let alpn = if context_cfg_flags & context_flags::ALPN != 0 {
        let alpn_len = cursor.read_u8()? as usize;
        debug!(len = alpn_len, "ALPN");
        if alpn_len == 0 {
            Some(AlpnNegotiation::NotNegotiated)
        } else {
            let bytes = cursor.take(alpn_len)?;
            match std::str::from_utf8(bytes) {
                Ok(name) if !name.contains('\0') => {
                    Some(AlpnNegotiation::Protocol(name.to_string()))
                }
                _ => Some(AlpnNegotiation::Malformed {
                    bytes: bytes.to_vec(),
                }),
            }
        }
    } else {
        None
    };

    Ok(ParsedContext {
        version,
        session_cfg_flags,
        context_cfg_flags,
        session,
        transform_random,
        connection_ids,
        replay_protection,
        datagram_packing_enabled,
        out_counter,
        mtu,
        alpn,
        trailing: cursor.remaining(),
    })
}
