//! Size constants of the serialized SSL context wire format.
//!
//! The context and session bounds match the serialization produced by
//! `mbedtls_ssl_context_save()`: the fixed parts of a context and session
//! record fit in `MAX_CONTEXT_LEN` / `MAX_SESSION_LEN` bytes, while the
//! embedded certificate and ticket each carry a 24-bit length prefix and can
//! therefore contribute up to `(1 << 24) - 1` bytes on their own.

/// Smallest number of bytes a serialized context can occupy (without its
/// embedded session).
pub const MIN_CONTEXT_LEN: usize = 84;

/// Smallest number of bytes a serialized session can occupy.
pub const MIN_SESSION_LEN: usize = 88;

/// Largest fixed-part context size (without session data).
pub const MAX_CONTEXT_LEN: usize = 875;

/// Largest fixed-part session size (without certificate and ticket data).
pub const MAX_SESSION_LEN: usize = 109;

/// Certificates carry a 24-bit length prefix.
pub const MAX_CERTIFICATE_LEN: usize = (1 << 24) - 1;

/// Session tickets carry a 24-bit length prefix.
pub const MAX_TICKET_LEN: usize = (1 << 24) - 1;

/// ServerHello.random concatenated with ClientHello.random.
pub const TRANSFORM_RANDBYTE_LEN: usize = 64;

/// Smallest plausible serialized payload: minimal context plus minimal session.
pub const MIN_SERIALIZED_DATA: usize = MIN_CONTEXT_LEN + MIN_SESSION_LEN;

/// Largest plausible serialized payload.
pub const MAX_SERIALIZED_DATA: usize =
    MAX_CONTEXT_LEN + MAX_SESSION_LEN + MAX_CERTIFICATE_LEN + MAX_TICKET_LEN;

/// A base64 run shorter than this cannot hold a serialized context.
pub const MIN_BASE64_LEN: usize = MIN_SERIALIZED_DATA * 4 / 3;

/// Hard cap for the base64 run buffer.
pub const MAX_BASE64_LEN: usize = MAX_SERIALIZED_DATA * 4 / 3 + 3;

/// Initial capacity of the scratch buffers.
pub const INIT_BUF_LEN: usize = 4096;

/// Fixed increment by which the run buffer grows towards [`MAX_BASE64_LEN`].
pub const GROW_STEP: usize = 4096;
