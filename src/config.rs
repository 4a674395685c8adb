//! Runtime configuration for the decoders.

/// Decoding assumptions that the wire format does not record.
///
/// The serialization was produced by a library build whose compile-time
/// options decided whether the peer certificate is stored verbatim or as a
/// digest, and whether the DTLS-specific trailer fields exist at all.
/// Nothing in the blob self-describes those choices, so the operator has to
/// supply them. When they are set wrong for a given blob, parsing silently
/// desynchronizes: later fields are read as the wrong type until a bounds
/// check fails, or the decode even "succeeds" with garbage. That ambiguity
/// is inherent to the format and is deliberately not papered over here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// The producing build kept the peer certificate verbatim
    /// (as opposed to a digest only).
    pub keep_peer_certificate: bool,
    /// The producing build included DTLS support, so the DTLS trailer
    /// fields (datagram packing flag, MTU) are present.
    pub dtls_enabled: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            keep_peer_certificate: true,
            dtls_enabled: true,
        }
    }
}
