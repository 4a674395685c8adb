//! End-to-end tests for the scan -> decode -> report pipeline.
//!
//! Fixtures are built with a small encoder that mirrors the wire layout, so
//! a decoded context can be checked field-for-field against the values that
//! went in.

use std::io::Cursor;

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;

use ssl_context_info::context::{context_flags, AlpnNegotiation};
use ssl_context_info::session::{session_flags, MaxFragmentLength, PeerCertificate};
use ssl_context_info::{decode_context, RuntimeConfig, ScanSession};

/// Test-side encoder for a serialized session record.
struct SessionFixture {
    start_time: Option<u64>,
    ciphersuite: u16,
    digest: Option<(u8, Vec<u8>)>,
    ticket: Option<(Vec<u8>, u32)>,
    mfl_code: Option<u8>,
    truncated_hmac: Option<u8>,
    encrypt_then_mac: Option<u8>,
}

impl SessionFixture {
    fn minimal() -> Self {
        Self {
            start_time: None,
            ciphersuite: 0xc02b,
            digest: None,
            ticket: None,
            mfl_code: None,
            truncated_hmac: None,
            encrypt_then_mac: None,
        }
    }

    fn flags(&self) -> u16 {
        let mut flags = 0;
        if self.start_time.is_some() {
            flags |= session_flags::TIME;
        }
        if self.digest.is_some() {
            flags |= session_flags::CERTIFICATE;
        }
        if self.ticket.is_some() {
            flags |= session_flags::CLIENT_TICKET;
        }
        if self.mfl_code.is_some() {
            flags |= session_flags::MFL;
        }
        if self.truncated_hmac.is_some() {
            flags |= session_flags::TRUNCATED_HMAC;
        }
        if self.encrypt_then_mac.is_some() {
            flags |= session_flags::ENCRYPT_THEN_MAC;
        }
        flags
    }

    fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        if let Some(t) = self.start_time {
            bytes.extend_from_slice(&t.to_be_bytes());
        }
        bytes.extend_from_slice(&self.ciphersuite.to_be_bytes());
        bytes.push(0); // no compression
        bytes.push(32);
        bytes.extend_from_slice(&[0x41; 32]);
        bytes.extend_from_slice(&[0x42; 48]);
        bytes.extend_from_slice(&0u32.to_be_bytes());
        if let Some((alg, digest)) = &self.digest {
            bytes.push(*alg);
            bytes.push(digest.len() as u8);
            bytes.extend_from_slice(digest);
        }
        if let Some((data, lifetime)) = &self.ticket {
            let len = data.len() as u32;
            bytes.extend_from_slice(&len.to_be_bytes()[1..4]);
            bytes.extend_from_slice(data);
            bytes.extend_from_slice(&lifetime.to_be_bytes());
        }
        if let Some(code) = self.mfl_code {
            bytes.push(code);
        }
        if let Some(v) = self.truncated_hmac {
            bytes.push(v);
        }
        if let Some(v) = self.encrypt_then_mac {
            bytes.push(v);
        }
        bytes
    }
}

/// Test-side encoder for a full context blob around a session fixture.
struct ContextFixture {
    session: SessionFixture,
    cids: Option<(Vec<u8>, Vec<u8>)>,
    badmac: Option<(u32, u64, u64)>,
    alpn: Option<Vec<u8>>,
}

impl ContextFixture {
    fn minimal() -> Self {
        Self {
            session: SessionFixture::minimal(),
            cids: None,
            badmac: None,
            alpn: None,
        }
    }

    fn encode(&self) -> Vec<u8> {
        let mut context_cfg = 0u32;
        if self.cids.is_some() {
            context_cfg |= context_flags::DTLS_CONNECTION_ID;
        }
        if self.badmac.is_some() {
            context_cfg |= context_flags::DTLS_BADMAC_LIMIT;
        }
        if self.alpn.is_some() {
            context_cfg |= context_flags::ALPN;
        }

        let session = self.session.encode();
        let mut blob = vec![3, 6, 0];
        blob.extend_from_slice(&self.session.flags().to_be_bytes());
        blob.extend_from_slice(&context_cfg.to_be_bytes()[1..4]);
        blob.extend_from_slice(&(session.len() as u32).to_be_bytes());
        blob.extend_from_slice(&session);
        blob.extend_from_slice(&[0x5c; 64]);
        if let Some((incoming, outgoing)) = &self.cids {
            blob.push(incoming.len() as u8);
            blob.extend_from_slice(incoming);
            blob.push(outgoing.len() as u8);
            blob.extend_from_slice(outgoing);
        }
        if let Some((seen, top, window)) = self.badmac {
            blob.extend_from_slice(&seen.to_be_bytes());
            blob.extend_from_slice(&top.to_be_bytes());
            blob.extend_from_slice(&window.to_be_bytes());
        }
        blob.push(0); // datagram packing enabled
        blob.extend_from_slice(&42u64.to_be_bytes());
        blob.extend_from_slice(&1400u16.to_be_bytes());
        if let Some(alpn) = &self.alpn {
            blob.push(alpn.len() as u8);
            blob.extend_from_slice(alpn);
        }
        blob
    }
}

fn scan(input: &str) -> (ssl_context_info::ScanSummary, String) {
    let mut session = ScanSession::new(RuntimeConfig::default());
    let mut out = Vec::new();
    let summary = session
        .process(Cursor::new(input.as_bytes().to_vec()), &mut out)
        .unwrap();
    (summary, String::from_utf8(out).unwrap())
}

#[test]
fn noise_only_file_reports_no_codes() {
    let (summary, out) = scan("not base64 at all !!!");
    assert_eq!(summary.runs_found, 0);
    assert_eq!(summary.failed, 0);
    assert!(out.is_empty());
}

#[test]
fn minimal_blob_round_trips_through_text() {
    let blob = ContextFixture::minimal().encode();
    let text = format!(
        "2024-01-01 12:00:00 dumping context:\n{}\ndone.\n",
        STANDARD.encode(&blob)
    );
    let (summary, out) = scan(&text);
    assert_eq!(summary.runs_found, 1);
    assert_eq!(summary.decoded, 1);
    assert!(out.contains("Session info:"));
    assert!(out.contains("0xc02b"));
}

#[test]
fn url_safe_encoding_is_accepted() {
    let blob = ContextFixture::minimal().encode();
    let (summary, _) = scan(&URL_SAFE.encode(&blob));
    assert_eq!(summary.decoded, 1);
}

#[test]
fn fully_featured_blob_decodes_field_for_field() {
    let mut fixture = ContextFixture::minimal();
    fixture.session.start_time = Some(1_700_000_000);
    fixture.session.ticket = Some((vec![9; 16], 7200));
    fixture.session.mfl_code = Some(4);
    fixture.session.truncated_hmac = Some(0);
    fixture.session.encrypt_then_mac = Some(1);
    fixture.cids = Some((vec![0xaa; 4], vec![]));
    fixture.badmac = Some((2, 0x10, 0b1011));
    fixture.alpn = Some(b"http/1.1".to_vec());

    let blob = fixture.encode();
    let ctx = decode_context(&blob, &RuntimeConfig::default()).unwrap();

    assert_eq!(ctx.version, (3, 6, 0));
    let session = &ctx.session;
    assert_eq!(session.start_time, Some(1_700_000_000));
    assert_eq!(session.ciphersuite.id, 0xc02b);
    let ticket = session.ticket.as_ref().unwrap();
    assert_eq!(ticket.data.len(), 16);
    assert_eq!(ticket.lifetime_secs, 7200);
    assert_eq!(session.max_fragment_length, Some(MaxFragmentLength::Mfl4096));
    assert_eq!(session.truncated_hmac, Some(false));
    assert_eq!(session.encrypt_then_mac, Some(true));
    assert_eq!(session.trailing, 0);

    let cids = ctx.connection_ids.as_ref().unwrap();
    assert_eq!(cids.incoming, vec![0xaa; 4]);
    assert!(cids.outgoing.is_empty());
    let replay = ctx.replay_protection.unwrap();
    assert_eq!(replay.badmac_seen, 2);
    assert_eq!(replay.in_window_top, 0x10);
    assert_eq!(replay.in_window, 0b1011);
    assert_eq!(ctx.out_counter, 42);
    assert_eq!(ctx.mtu, Some(1400));
    assert_eq!(ctx.alpn, Some(AlpnNegotiation::Protocol("http/1.1".into())));
    assert_eq!(ctx.trailing, 0);
}

#[test]
fn certificate_digest_branch_decodes_without_dtls() {
    let mut fixture = ContextFixture::minimal();
    fixture.session.digest = Some((6, vec![0x77; 32])); // SHA256

    // Build without the DTLS trailer fields this time.
    let session = fixture.session.encode();
    let mut blob = vec![3, 6, 0];
    blob.extend_from_slice(&fixture.session.flags().to_be_bytes());
    blob.extend_from_slice(&[0, 0, 0]);
    blob.extend_from_slice(&(session.len() as u32).to_be_bytes());
    blob.extend_from_slice(&session);
    blob.extend_from_slice(&[0x5c; 64]);
    blob.extend_from_slice(&1u64.to_be_bytes()); // out counter only

    let cfg = RuntimeConfig {
        keep_peer_certificate: false,
        dtls_enabled: false,
    };
    let ctx = decode_context(&blob, &cfg).unwrap();
    match &ctx.session.peer_certificate {
        Some(PeerCertificate::Digest { digest, .. }) => assert_eq!(digest.len(), 32),
        other => panic!("expected digest, got {other:?}"),
    }
    assert_eq!(ctx.datagram_packing_enabled, None);
    assert_eq!(ctx.mtu, None);
    assert_eq!(ctx.trailing, 0);
}

#[test]
fn bad_blob_does_not_stop_the_scan() {
    let good = ContextFixture::minimal().encode();
    let mut bad = good.clone();
    bad.truncate(bad.len() - 1); // kill the MTU field

    let text = format!("{}\nnoise\n{}", STANDARD.encode(&bad), STANDARD.encode(&good));
    let (summary, out) = scan(&text);
    assert_eq!(summary.runs_found, 2);
    assert_eq!(summary.decoded, 1);
    assert_eq!(summary.failed, 1);
    assert!(out.contains("Deserializing number 2:"));
}

#[test]
fn short_runs_never_reach_the_decoder() {
    // A real (short) base64 string, e.g. someone's API key in the same log.
    let (summary, _) = scan("token=dGhpcyBpcyBub3QgYSBjb250ZXh0Cg==\n");
    assert_eq!(summary.runs_found, 0);
}

#[test]
fn alpn_flag_with_zero_length_reports_not_negotiated() {
    let mut fixture = ContextFixture::minimal();
    fixture.alpn = Some(Vec::new());
    let ctx = decode_context(&fixture.encode(), &RuntimeConfig::default()).unwrap();
    assert_eq!(ctx.alpn, Some(AlpnNegotiation::NotNegotiated));
}
