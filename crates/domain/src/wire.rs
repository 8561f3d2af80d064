//! DNS wire format (RFC 1035 §4.1).
//!
//! All numeric fields are big-endian. Names are decoded with full support
//! for compression pointers and always encoded uncompressed.

mod decoder;
mod encoder;

pub use decoder::decode;
pub use encoder::encode;

/// Size of the fixed message header.
pub const HEADER_LEN: usize = 12;

/// Largest datagram the server reads or accepts from an upstream.
pub const MAX_PACKET_SIZE: usize = 4096;

/// Maximum length of one TXT character-string.
pub(crate) const MAX_CHARACTER_STRING: usize = 255;
