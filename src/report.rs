//! Report model and text rendering.
//!
//! Decoded structures are flattened into named, typed fields grouped into
//! sections; rendering to text happens afterwards and carries no decoding
//! logic of its own. Downstream code (and the tests) can inspect the typed
//! fields without scraping the text output.

use std::io::{self, Write};

use chrono::{TimeZone, Utc};
use compact_str::{format_compact, CompactString};

use crate::context::{enabled_flag_names, AlpnNegotiation, ParsedContext};
use crate::session::{ParsedSession, PeerCertificate};

/// Hex bytes per line in rendered dumps.
const HEX_PER_LINE: usize = 16;

/// One typed report value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    U8(u8),
    U16(u16),
    U32(u32),
    /// 32-bit value rendered as a hex bitmask.
    HexU32(u32),
    /// 64-bit value rendered as hex (sequence counters, replay bitmaps).
    HexU64(u64),
    /// Rendered as enabled/disabled.
    Enabled(bool),
    Str(CompactString),
    /// Rendered as a grouped hex dump.
    Bytes(Vec<u8>),
    /// Unix timestamp, rendered as UTC or "unknown" when unrepresentable.
    Time(u64),
    /// Rendered as "none".
    Null,
}

/// A titled group of fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: &'static str,
    pub fields: Vec<(&'static str, FieldValue)>,
}

impl Section {
    fn new(title: &'static str) -> Self {
        Self {
            title,
            fields: Vec::new(),
        }
    }

    fn push(&mut self, name: &'static str, value: FieldValue) {
        self.fields.push((name, value));
    }
}

/// Format a Unix timestamp as UTC, or "unknown" when out of range.
pub fn format_time(timestamp: u64) -> CompactString {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .map(|dt| format_compact!("{}", dt.format("%Y-%m-%d %H:%M:%S")))
        .unwrap_or_else(|| CompactString::const_new("unknown"))
}

fn enabled_str(enabled: bool) -> &'static str {
    if enabled {
        "enabled"
    } else {
        "disabled"
    }
}

/// Flatten a decoded context into report sections.
pub fn context_sections(ctx: &ParsedContext) -> Vec<Section> {
    let mut sections = Vec::new();

    let mut header = Section::new("Serializer version");
    let (major, minor, patch) = ctx.version;
    header.push("version", FieldValue::Str(format_compact!("{major}.{minor}.{patch}")));
    sections.push(header);

    let mut config = Section::new("Enabled session and context configuration");
    let names = enabled_flag_names(ctx.session_cfg_flags, ctx.context_cfg_flags);
    if names.is_empty() {
        config.push("options", FieldValue::Null);
    } else {
        for name in names {
            config.push("option", FieldValue::Str(CompactString::const_new(name)));
        }
    }
    sections.push(config);

    sections.extend(session_sections(&ctx.session));

    let mut random = Section::new("Random bytes");
    random.push(
        "ServerHello+ClientHello random",
        FieldValue::Bytes(ctx.transform_random.to_vec()),
    );
    sections.push(random);

    let mut others = Section::new("Context others");
    if let Some(cids) = &ctx.connection_ids {
        others.push("in CID", bytes_or_none(&cids.incoming));
        others.push("out CID", bytes_or_none(&cids.outgoing));
    }
    if let Some(replay) = &ctx.replay_protection {
        others.push("bad MAC seen number", FieldValue::U32(replay.badmac_seen));
        others.push(
            "last validated record sequence no.",
            FieldValue::HexU64(replay.in_window_top),
        );
        others.push(
            "bitmask for replay detection",
            FieldValue::HexU64(replay.in_window),
        );
    }
    if let Some(packing) = ctx.datagram_packing_enabled {
        others.push("DTLS datagram packing", FieldValue::Enabled(packing));
    }
    others.push(
        "outgoing record sequence no.",
        FieldValue::HexU64(ctx.out_counter),
    );
    if let Some(mtu) = ctx.mtu {
        others.push("MTU", FieldValue::U16(mtu));
    }
    match &ctx.alpn {
        Some(AlpnNegotiation::NotNegotiated) => {
            others.push("ALPN negotiation", FieldValue::Str("not selected".into()));
        }
        Some(AlpnNegotiation::Protocol(name)) => {
            others.push("ALPN negotiation", FieldValue::Str(name.as_str().into()));
        }
        Some(AlpnNegotiation::Malformed { bytes }) => {
            others.push("ALPN negotiation (malformed)", FieldValue::Bytes(bytes.clone()));
        }
        None => {}
    }
    if ctx.trailing > 0 {
        others.push(
            "bytes left to analyze from context",
            FieldValue::U32(ctx.trailing as u32),
        );
    }
    sections.push(others);

    sections
}

fn session_sections(session: &ParsedSession) -> Vec<Section> {
    let mut sections = Vec::new();

    let mut info = Section::new("Session info");
    if let Some(start) = session.start_time {
        info.push("start time", FieldValue::Time(start));
    }
    let suite = &session.ciphersuite;
    info.push(
        "ciphersuite",
        FieldValue::Str(match suite.name {
            Some(name) => format_compact!("{name} ({:#06x})", suite.id),
            None => format_compact!("unknown ({:#06x})", suite.id),
        }),
    );
    info.push("compression", FieldValue::Enabled(session.compression != 0));
    info.push("session ID", FieldValue::Bytes(session.session_id.to_vec()));
    info.push(
        "master secret",
        FieldValue::Bytes(session.master_secret.to_vec()),
    );
    info.push("verify result", FieldValue::HexU32(session.verify_result));
    sections.push(info);

    match &session.peer_certificate {
        Some(PeerCertificate::Absent) => {
            let mut cert = Section::new("Certificate");
            cert.push("certificate", FieldValue::Null);
            sections.push(cert);
        }
        Some(PeerCertificate::Parsed(cert_info)) => {
            let mut cert = Section::new("Certificate");
            cert.push("cert. version", FieldValue::U32(cert_info.version + 1));
            cert.push("serial number", FieldValue::Str(cert_info.serial.as_str().into()));
            cert.push("subject", FieldValue::Str(cert_info.subject.as_str().into()));
            cert.push("issuer", FieldValue::Str(cert_info.issuer.as_str().into()));
            cert.push("valid from", FieldValue::Str(cert_info.not_before.as_str().into()));
            cert.push("valid until", FieldValue::Str(cert_info.not_after.as_str().into()));
            cert.push(
                "signature algorithm",
                FieldValue::Str(cert_info.signature_algorithm.as_str().into()),
            );
            sections.push(cert);
        }
        Some(PeerCertificate::Unparsable { der, reason }) => {
            let mut cert = Section::new("Certificate");
            cert.push("invalid X.509", FieldValue::Str(reason.as_str().into()));
            cert.push("cannot deserialize", FieldValue::Bytes(der.clone()));
            sections.push(cert);
        }
        Some(PeerCertificate::Digest { algorithm, digest }) => {
            let mut cert = Section::new("Certificate");
            cert.push(
                "peer digest",
                FieldValue::Str(CompactString::const_new(algorithm.name())),
            );
            if digest.is_empty() {
                cert.push("peer digest cert", FieldValue::Null);
            } else {
                cert.push("peer digest cert", FieldValue::Bytes(digest.clone()));
            }
            sections.push(cert);
        }
        None => {}
    }

    if let Some(ticket) = &session.ticket {
        let mut tick = Section::new("Ticket");
        if ticket.data.is_empty() {
            tick.push("ticket", FieldValue::Null);
        } else {
            tick.push("ticket", FieldValue::Bytes(ticket.data.clone()));
        }
        tick.push("lifetime (sec.)", FieldValue::U32(ticket.lifetime_secs));
        sections.push(tick);
    }

    let mut others = Section::new("Session others");
    if let Some(mfl) = session.max_fragment_length {
        others.push("MFL", FieldValue::Str(CompactString::const_new(mfl.as_str())));
    }
    if let Some(trunc) = session.truncated_hmac {
        others.push("negotiate truncated HMAC", FieldValue::Enabled(trunc));
    }
    if let Some(etm) = session.encrypt_then_mac {
        others.push("Encrypt-then-MAC", FieldValue::Enabled(etm));
    }
    if session.trailing > 0 {
        others.push(
            "bytes left to analyze from session",
            FieldValue::U32(session.trailing as u32),
        );
    }
    if !others.fields.is_empty() {
        sections.push(others);
    }

    sections
}

fn bytes_or_none(bytes: &[u8]) -> FieldValue {
    if bytes.is_empty() {
        FieldValue::Null
    } else {
        FieldValue::Bytes(bytes.to_vec())
    }
}

/// Write a grouped hex dump, continuation lines indented with `prefix`.
pub fn write_hex<W: Write>(w: &mut W, bytes: &[u8], prefix: &str) -> io::Result<()> {
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 && i % HEX_PER_LINE == 0 {
            writeln!(w)?;
            write!(w, "{prefix}")?;
        }
        write!(w, "{byte:02X} ")?;
    }
    writeln!(w)
}

/// Render sections as indented text.
pub fn render<W: Write>(w: &mut W, sections: &[Section]) -> io::Result<()> {
    for section in sections {
        writeln!(w, "\n{}:", section.title)?;
        for (name, value) in &section.fields {
            write!(w, "\t{name:<34} : ")?;
            match value {
                FieldValue::U8(v) => writeln!(w, "{v}")?,
                FieldValue::U16(v) => writeln!(w, "{v}")?,
                FieldValue::U32(v) => writeln!(w, "{v}")?,
                FieldValue::HexU32(v) => writeln!(w, "{v:#010x}")?,
                FieldValue::HexU64(v) => writeln!(w, "{v:#018x}")?,
                FieldValue::Enabled(v) => writeln!(w, "{}", enabled_str(*v))?,
                FieldValue::Str(s) => writeln!(w, "{s}")?,
                FieldValue::Bytes(bytes) => {
                    // Continuation lines align under the value column.
                    let prefix = format!("\t{:<34}   ", "");
                    write_hex(w, bytes, &prefix)?;
                }
                FieldValue::Time(t) => writeln!(w, "{}", format_time(*t))?,
                FieldValue::Null => writeln!(w, "none")?,
            }
        }
    }
    writeln!(w)
}

/// Render a decoded context as text.
pub fn render_context<W: Write>(w: &mut W, ctx: &ParsedContext) -> io::Result<()> {
    render(w, &context_sections(ctx))
}
