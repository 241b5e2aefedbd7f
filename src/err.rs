use thiserror::Error;

pub type StoreResult<T> = std::result::Result<T, StoreError>;
pub type SerializationResult<T> = std::result::Result<T, SerializationError>;
pub type DeserializationResult<T> = std::result::Result<T, DeserializationError>;

/// Errors raised by in-memory store and tree operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("attribute `{name}` is not set on this node or any of its parents")]
    AttributeNotFound { name: String },

    #[error("refusing to append: {reason}")]
    InvalidAppendTarget { reason: &'static str },
}

/// Errors raised while encoding an event into its wire form.
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("i/o error while writing message: {0}")]
    Io(#[from] std::io::Error),

    #[error("attribute `{name}` has unsupported type `{kind}` for its schema field")]
    UnsupportedAttributeType { name: String, kind: &'static str },

    #[error("JSON value of kind `{kind}` has no attribute representation")]
    UnsupportedJsonValue { kind: &'static str },

    #[error("{what} is too large to encode ({len} bytes)")]
    ValueTooLarge { what: &'static str, len: usize },

    #[error("value nesting exceeds the limit of {limit} levels")]
    NestingTooDeep { limit: usize },
}

/// Errors raised while decoding an event from its wire form.
///
/// Offsets are relative to the start of the message buffer.
#[derive(Debug, Error)]
pub enum DeserializationError {
    #[error("not an event message: {detail}")]
    UnsupportedMessageType { detail: String },

    #[error("unknown value tag `{tag:#04x}` at offset {offset}")]
    UnsupportedAttributeType { tag: u8, offset: u64 },

    #[error("message body CRC32 mismatch: expected {expected:#010x}, found {found:#010x}")]
    ChecksumMismatch { expected: u32, found: u32 },

    #[error("buffer too small for {what} at offset {offset} (need {need} bytes, have {have})")]
    Truncated {
        what: &'static str,
        offset: u64,
        need: usize,
        have: usize,
    },

    #[error("invalid utf-8 in {what} at offset {offset}: {source}")]
    InvalidUtf8String {
        what: &'static str,
        offset: u64,
        source: std::str::Utf8Error,
    },

    #[error("value nesting exceeds the limit of {limit} levels at offset {offset}")]
    NestingTooDeep { limit: usize, offset: u64 },
}
