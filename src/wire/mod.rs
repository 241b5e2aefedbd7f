//! Tagged binary wire format for events.
//!
//! Every message is self contained (all integers little endian):
//!
//! ```text
//! "TSEV" | version u8 | body_len u32 | body | crc32(body) u32
//! body  :=  fixed_count u8 | fixed fields | attr_count u32 | attributes
//! ```
//!
//! Fixed fields carry the schema scalars (timestamp, the source fields,
//! pathspec and friends) as `tag u8 + payload`; every other attribute rides
//! in the dynamic section as a `name + tagged value` pair. Dicts and arrays
//! nest, capped by [`CodecOptions::max_depth`].

mod cursor;
mod decode;
mod encode;
mod schema;

pub use decode::{decode_event, decode_event_with_options};
pub use encode::{encode_event, encode_event_with_options};

/// Magic prefix of every serialized event message.
pub const EVENT_MESSAGE_MAGIC: &[u8; 4] = b"TSEV";

/// Current wire format version.
pub const WIRE_VERSION: u8 = 1;

const DEFAULT_MAX_DEPTH: usize = 32;

/// Codec configuration, shared by the encode and decode entry points.
///
/// ```
/// use timestore::CodecOptions;
///
/// let options = CodecOptions::new().validate_checksums(false).max_depth(8);
/// assert!(!options.should_validate_checksums());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecOptions {
    pub(crate) validate_checksums: bool,
    pub(crate) max_depth: usize,
}

impl Default for CodecOptions {
    fn default() -> Self {
        CodecOptions {
            validate_checksums: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl CodecOptions {
    pub fn new() -> Self {
        Default::default()
    }

    /// Toggles CRC32 validation of the message body on decode.
    pub fn validate_checksums(mut self, validate_checksums: bool) -> Self {
        self.validate_checksums = validate_checksums;
        self
    }

    /// Caps how deeply dict and array values may nest, on both codec sides.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn should_validate_checksums(&self) -> bool {
        self.validate_checksums
    }
}
