//! ssl-context-info CLI entry point.

use std::fs::File;
use std::io::{self, BufReader};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ssl_context_info::cli::Args;
use ssl_context_info::{RuntimeConfig, ScanSession};

fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging; reports go to stdout, diagnostics to stderr.
    let filter = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(io::stderr)
        .init();

    let file = File::open(&args.file)
        .with_context(|| format!("cannot open file \"{}\"", args.file.display()))?;

    let config = RuntimeConfig {
        keep_peer_certificate: args.keep_peer_cert,
        dtls_enabled: args.dtls,
    };

    let mut session = ScanSession::new(config);
    let mut stdout = io::stdout().lock();
    let summary = session.process(BufReader::new(file), &mut stdout)?;

    if summary.runs_found == 0 {
        println!("Finished. No valid base64 code found");
    } else {
        println!(
            "Finished. Found {} base64 code(s): {} decoded, {} failed",
            summary.runs_found, summary.decoded, summary.failed
        );
    }

    Ok(())
}
