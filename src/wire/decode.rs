use log::{trace, warn};

use crate::err::{DeserializationError, DeserializationResult};
use crate::event::EventObject;
use crate::value::{Value, ValueMap};
use crate::wire::cursor::ByteCursor;
use crate::wire::schema::{
    DEFAULT_SOURCE_NAME, FieldKind, TAG_ARRAY, TAG_BOOLEAN, TAG_BYTES, TAG_DICT, TAG_INTEGER,
    TAG_STRING, fixed_field_by_tag, source_name_for_code,
};
use crate::wire::{CodecOptions, EVENT_MESSAGE_MAGIC, WIRE_VERSION};

/// Decodes an event message with default options.
pub fn decode_event(data: &[u8]) -> DeserializationResult<EventObject> {
    decode_event_with_options(data, &CodecOptions::default())
}

/// Decodes a standalone wire message into a fresh, parentless event.
///
/// The buffer must hold exactly one message; an event is returned only when
/// every field decodes, so no partially populated events escape. Dynamic
/// attributes sharing a name with a fixed field win.
pub fn decode_event_with_options(
    data: &[u8],
    options: &CodecOptions,
) -> DeserializationResult<EventObject> {
    let mut cursor = ByteCursor::new(data);

    let magic = cursor.array::<4>("magic")?;
    if &magic != EVENT_MESSAGE_MAGIC {
        return Err(DeserializationError::UnsupportedMessageType {
            detail: format!("invalid magic, expected `TSEV`, found `{magic:02x?}`"),
        });
    }

    let version = cursor.u8("version")?;
    if version != WIRE_VERSION {
        return Err(DeserializationError::UnsupportedMessageType {
            detail: format!("unsupported wire version {version}"),
        });
    }

    let body_len = cursor.u32("body length")? as usize;
    let body_end = cursor.position() as usize + body_len;

    // Probe past the body so the envelope is fully validated before any
    // field parsing starts.
    let (body, stored_checksum) = {
        let mut probe = cursor;
        let body = probe.take_bytes(body_len, "message body")?;
        let stored_checksum = probe.u32("body checksum")?;
        if probe.remaining() != 0 {
            return Err(DeserializationError::UnsupportedMessageType {
                detail: format!("{} trailing bytes after message end", probe.remaining()),
            });
        }
        (body, stored_checksum)
    };

    if options.validate_checksums {
        let computed = crc32fast::hash(body);
        if computed != stored_checksum {
            return Err(DeserializationError::ChecksumMismatch {
                expected: stored_checksum,
                found: computed,
            });
        }
    }

    let event = decode_body(&mut cursor, options)?;

    if cursor.position() as usize != body_end {
        return Err(DeserializationError::UnsupportedMessageType {
            detail: format!(
                "message fields end at offset {} but body ends at offset {body_end}",
                cursor.position()
            ),
        });
    }

    Ok(event)
}

fn decode_body(
    cursor: &mut ByteCursor<'_>,
    options: &CodecOptions,
) -> DeserializationResult<EventObject> {
    let event = EventObject::new();

    let fixed_count = cursor.u8("fixed field count")?;
    for _ in 0..fixed_count {
        let offset = cursor.position();
        let tag = cursor.u8("fixed field tag")?;
        let Some((name, kind)) = fixed_field_by_tag(tag) else {
            return Err(DeserializationError::UnsupportedMessageType {
                detail: format!("unknown fixed field tag `{tag:#04x}` at offset {offset}"),
            });
        };
        trace!("Offset `0x{offset:08x} ({offset})`: fixed field `{name}`");

        let value = match kind {
            FieldKind::I64 => Value::Integer(cursor.i64(name)?),
            FieldKind::Str => Value::String(read_str(cursor, name)?),
            FieldKind::Source => {
                let code = cursor.u8(name)?;
                let source = source_name_for_code(code).unwrap_or_else(|| {
                    warn!(
                        "unknown source code {code} at offset {offset}; \
                         falling back to `{DEFAULT_SOURCE_NAME}`"
                    );
                    DEFAULT_SOURCE_NAME
                });
                Value::String(source.to_owned())
            }
            FieldKind::Bytes => Value::Bytes(read_bytes(cursor, name)?),
        };
        event.set_value(name, value);
    }

    let attr_count = cursor.u32("attribute count")?;
    for _ in 0..attr_count {
        let offset = cursor.position();
        let name = read_name(cursor)?;
        trace!("Offset `0x{offset:08x} ({offset})`: attribute `{name}`");

        let value = read_value(cursor, 0, options.max_depth)?;
        event.set_value(name, value);
    }

    Ok(event)
}

fn read_name(cursor: &mut ByteCursor<'_>) -> DeserializationResult<String> {
    let len = cursor.u16("attribute name length")? as usize;
    Ok(cursor.utf8(len, "attribute name")?.to_owned())
}

fn read_str(cursor: &mut ByteCursor<'_>, what: &'static str) -> DeserializationResult<String> {
    let len = cursor.u32(what)? as usize;
    Ok(cursor.utf8(len, what)?.to_owned())
}

fn read_bytes(cursor: &mut ByteCursor<'_>, what: &'static str) -> DeserializationResult<Vec<u8>> {
    let len = cursor.u32(what)? as usize;
    Ok(cursor.take_bytes(len, what)?.to_vec())
}

fn read_value(
    cursor: &mut ByteCursor<'_>,
    depth: usize,
    limit: usize,
) -> DeserializationResult<Value> {
    if depth >= limit {
        return Err(DeserializationError::NestingTooDeep {
            limit,
            offset: cursor.position(),
        });
    }

    let offset = cursor.position();
    let tag = cursor.u8("value tag")?;
    let value = match tag {
        TAG_STRING => Value::String(read_str(cursor, "string value")?),
        TAG_INTEGER => Value::Integer(cursor.i64("integer value")?),
        TAG_BOOLEAN => {
            let raw = cursor.u8("boolean value")?;
            let value = match raw {
                0 => false,
                1 => true,
                irregular => {
                    warn!(
                        "invalid boolean value {} at offset {}; treating as {}",
                        irregular,
                        offset,
                        irregular != 0
                    );
                    irregular != 0
                }
            };
            Value::Boolean(value)
        }
        TAG_BYTES => Value::Bytes(read_bytes(cursor, "bytes value")?),
        TAG_DICT => {
            let count = cursor.u32("dict entry count")?;
            let mut entries = ValueMap::default();
            for _ in 0..count {
                let name = read_name(cursor)?;
                let value = read_value(cursor, depth + 1, limit)?;
                entries.insert(name, value);
            }
            Value::Dict(entries)
        }
        TAG_ARRAY => {
            let count = cursor.u32("array item count")?;
            // Sized by contents, not by the declared count.
            let mut items = Vec::new();
            for _ in 0..count {
                items.push(read_value(cursor, depth + 1, limit)?);
            }
            Value::Array(items)
        }
        tag => {
            return Err(DeserializationError::UnsupportedAttributeType { tag, offset });
        }
    };

    Ok(value)
}
