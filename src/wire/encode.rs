use byteorder::{LittleEndian, WriteBytesExt};
use log::{trace, warn};

use crate::err::{SerializationError, SerializationResult};
use crate::event::EventObject;
use crate::value::Value;
use crate::wire::schema::{
    DEFAULT_SOURCE_CODE, DEFAULT_SOURCE_NAME, FieldKind, TAG_ARRAY, TAG_BOOLEAN, TAG_BYTES,
    TAG_DICT, TAG_INTEGER, TAG_STRING, fixed_field_by_name, source_code_for_name,
};
use crate::wire::{CodecOptions, EVENT_MESSAGE_MAGIC, WIRE_VERSION};

/// Encodes an event into a standalone wire message with default options.
pub fn encode_event(event: &EventObject) -> SerializationResult<Vec<u8>> {
    encode_event_with_options(event, &CodecOptions::default())
}

/// Encodes an event into a standalone wire message.
///
/// The resolved attribute union is walked in sorted name order, so two events
/// carrying equal attributes produce identical bytes. Attributes inherited
/// from parent containers are materialized into the message; empty dynamic
/// values (empty strings, bytes, dicts and arrays) are dropped.
pub fn encode_event_with_options(
    event: &EventObject,
    options: &CodecOptions,
) -> SerializationResult<Vec<u8>> {
    let attributes = event.resolved_attributes();

    let mut fixed: Vec<u8> = Vec::new();
    let mut fixed_count: u8 = 0;
    let mut dynamic: Vec<u8> = Vec::new();
    let mut dynamic_count: usize = 0;

    for (name, value) in &attributes {
        match fixed_field_by_name(name) {
            Some((tag, kind)) => {
                encode_fixed_field(&mut fixed, tag, name, kind, value)?;
                fixed_count += 1;
            }
            None => {
                if value.is_empty() {
                    trace!("dropping empty attribute `{name}`");
                    continue;
                }
                write_name(&mut dynamic, name)?;
                write_value(&mut dynamic, value, 0, options.max_depth)?;
                dynamic_count += 1;
            }
        }
    }

    let attr_count = u32::try_from(dynamic_count).map_err(|_| SerializationError::ValueTooLarge {
        what: "attribute count",
        len: dynamic_count,
    })?;

    let mut body = Vec::with_capacity(1 + fixed.len() + 4 + dynamic.len());
    body.write_u8(fixed_count)?;
    body.extend_from_slice(&fixed);
    body.write_u32::<LittleEndian>(attr_count)?;
    body.extend_from_slice(&dynamic);

    let body_len = u32::try_from(body.len()).map_err(|_| SerializationError::ValueTooLarge {
        what: "message body",
        len: body.len(),
    })?;

    let mut message = Vec::with_capacity(body.len() + 13);
    message.extend_from_slice(EVENT_MESSAGE_MAGIC);
    message.write_u8(WIRE_VERSION)?;
    message.write_u32::<LittleEndian>(body_len)?;
    message.extend_from_slice(&body);
    message.write_u32::<LittleEndian>(crc32fast::hash(&body))?;

    trace!(
        "encoded event message: {} fixed fields, {} attributes, {} bytes",
        fixed_count,
        attr_count,
        message.len()
    );

    Ok(message)
}

fn encode_fixed_field(
    out: &mut Vec<u8>,
    tag: u8,
    name: &str,
    kind: FieldKind,
    value: &Value,
) -> SerializationResult<()> {
    match (kind, value) {
        (FieldKind::I64, Value::Integer(n)) => {
            out.write_u8(tag)?;
            out.write_i64::<LittleEndian>(*n)?;
        }
        (FieldKind::Str, Value::String(s)) => {
            out.write_u8(tag)?;
            write_str(out, s)?;
        }
        (FieldKind::Source, value) => {
            let code = match value.as_str().and_then(source_code_for_name) {
                Some(code) => code,
                None => {
                    warn!("unknown source_short {value:?}; falling back to `{DEFAULT_SOURCE_NAME}`");
                    DEFAULT_SOURCE_CODE
                }
            };
            out.write_u8(tag)?;
            out.write_u8(code)?;
        }
        (FieldKind::Bytes, Value::Bytes(bytes)) => {
            out.write_u8(tag)?;
            write_bytes(out, bytes)?;
        }
        (_, other) => {
            return Err(SerializationError::UnsupportedAttributeType {
                name: name.to_owned(),
                kind: other.kind(),
            });
        }
    }
    Ok(())
}

fn write_name(out: &mut Vec<u8>, name: &str) -> SerializationResult<()> {
    let len = u16::try_from(name.len()).map_err(|_| SerializationError::ValueTooLarge {
        what: "attribute name",
        len: name.len(),
    })?;
    out.write_u16::<LittleEndian>(len)?;
    out.extend_from_slice(name.as_bytes());
    Ok(())
}

fn write_str(out: &mut Vec<u8>, s: &str) -> SerializationResult<()> {
    let len = u32::try_from(s.len()).map_err(|_| SerializationError::ValueTooLarge {
        what: "string value",
        len: s.len(),
    })?;
    out.write_u32::<LittleEndian>(len)?;
    out.extend_from_slice(s.as_bytes());
    Ok(())
}

fn write_bytes(out: &mut Vec<u8>, bytes: &[u8]) -> SerializationResult<()> {
    let len = u32::try_from(bytes.len()).map_err(|_| SerializationError::ValueTooLarge {
        what: "bytes value",
        len: bytes.len(),
    })?;
    out.write_u32::<LittleEndian>(len)?;
    out.extend_from_slice(bytes);
    Ok(())
}

fn write_value(
    out: &mut Vec<u8>,
    value: &Value,
    depth: usize,
    limit: usize,
) -> SerializationResult<()> {
    if depth >= limit {
        return Err(SerializationError::NestingTooDeep { limit });
    }

    match value {
        Value::String(s) => {
            out.write_u8(TAG_STRING)?;
            write_str(out, s)?;
        }
        Value::Integer(n) => {
            out.write_u8(TAG_INTEGER)?;
            out.write_i64::<LittleEndian>(*n)?;
        }
        Value::Boolean(b) => {
            out.write_u8(TAG_BOOLEAN)?;
            out.write_u8(u8::from(*b))?;
        }
        Value::Bytes(bytes) => {
            out.write_u8(TAG_BYTES)?;
            write_bytes(out, bytes)?;
        }
        Value::Dict(entries) => {
            out.write_u8(TAG_DICT)?;
            let count = u32::try_from(entries.len()).map_err(|_| {
                SerializationError::ValueTooLarge {
                    what: "dict entry count",
                    len: entries.len(),
                }
            })?;
            out.write_u32::<LittleEndian>(count)?;

            // Sorted entries keep dict bytes deterministic.
            let mut names: Vec<&String> = entries.keys().collect();
            names.sort_unstable();
            for entry_name in names {
                write_name(out, entry_name)?;
                write_value(out, &entries[entry_name.as_str()], depth + 1, limit)?;
            }
        }
        Value::Array(items) => {
            out.write_u8(TAG_ARRAY)?;
            let count = u32::try_from(items.len()).map_err(|_| {
                SerializationError::ValueTooLarge {
                    what: "array item count",
                    len: items.len(),
                }
            })?;
            out.write_u32::<LittleEndian>(count)?;
            for item in items {
                write_value(out, item, depth + 1, limit)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_minimal_message_layout() {
        let event = EventObject::new();
        event.set_value("timestamp", 1_i64);

        let message = encode_event(&event).unwrap();

        // magic + version + body_len + body (count, tag, i64, attr count) + crc
        assert_eq!(message.len(), 4 + 1 + 4 + (1 + 1 + 8 + 4) + 4);
        assert_eq!(&message[0..4], b"TSEV");
        assert_eq!(message[4], WIRE_VERSION);
        assert_eq!(&message[5..9], &14_u32.to_le_bytes());
        assert_eq!(message[9], 1, "one fixed field");
        assert_eq!(message[10], 0x01, "timestamp tag");
        assert_eq!(&message[11..19], &1_i64.to_le_bytes());
        assert_eq!(&message[19..23], &0_u32.to_le_bytes(), "no attributes");
    }

    #[test]
    fn test_empty_dynamic_values_are_dropped() {
        let event = EventObject::new();
        event.set_value("timestamp", 1_i64);
        event.set_value("empty", "");
        event.set_value("no_bytes", Value::Bytes(Vec::new()));
        event.set_value("no_entries", Value::Dict(Default::default()));
        event.set_value("no_items", Value::Array(Vec::new()));
        event.set_value("zero", 0_i64);

        let message = encode_event(&event).unwrap();

        // Only `zero` survives: integers are never empty.
        let attr_count = u32::from_le_bytes(message[19..23].try_into().unwrap());
        assert_eq!(attr_count, 1);
    }

    #[test]
    fn test_unknown_source_short_encodes_the_default_code() {
        let event = EventObject::new();
        event.set_value("source_short", "NOSUCH");

        let message = encode_event(&event).unwrap();

        assert_eq!(message[9], 1, "one fixed field");
        assert_eq!(message[10], 0x04, "source_short tag");
        assert_eq!(message[11], DEFAULT_SOURCE_CODE);
    }

    #[test]
    fn test_fixed_field_type_mismatch_is_rejected() {
        let event = EventObject::new();
        event.set_value("timestamp", "noon");

        match encode_event(&event) {
            Err(SerializationError::UnsupportedAttributeType { name, kind }) => {
                assert_eq!(name, "timestamp");
                assert_eq!(kind, "string");
            }
            other => panic!("expected a type mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_nesting_limit_is_enforced() {
        let mut value = Value::from("leaf");
        for _ in 0..6 {
            value = Value::Array(vec![value]);
        }

        let event = EventObject::new();
        event.set_value("timestamp", 1_i64);
        event.set_value("deep", value);

        let options = CodecOptions::new().max_depth(4);
        assert!(matches!(
            encode_event_with_options(&event, &options),
            Err(SerializationError::NestingTooDeep { limit: 4 })
        ));
    }
}
