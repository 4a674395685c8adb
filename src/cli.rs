//! Command-line argument definitions.

use std::path::PathBuf;

use clap::Parser;

/// Deserialize and inspect Mbed TLS SSL contexts from base64 codes embedded
/// in a text file.
///
/// The file may contain many codes, separated by any non-base64 text
/// (newlines, log prefixes, prose). Each code is decoded and reported
/// independently.
#[derive(Parser, Debug)]
#[command(name = "ssl-context-info")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Text file containing the base64 codes
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Whether the producing library build kept the peer certificate
    /// verbatim. Pass false when it stored a certificate digest only, or
    /// when certificate information comes out garbled.
    #[arg(
        long = "keep-peer-cert",
        value_name = "BOOL",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub keep_peer_cert: bool,

    /// Whether the producing library build included DTLS support, which adds
    /// the datagram-packing flag and MTU fields to the serialized context
    #[arg(
        long = "dtls",
        value_name = "BOOL",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub dtls: bool,

    /// Increase diagnostic verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}
