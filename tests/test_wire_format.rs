use fixtures::*;

use pretty_assertions::assert_eq;
use timestore::{
    CodecOptions, DeserializationError, EventObject, StoreError, Value, decode_event,
    decode_event_with_options, encode_event,
};

#[test]
fn test_round_trip_preserves_all_but_empty_attributes() {
    ensure_env_logger_initialized();

    let event = EventObject::new();
    event.set_value("timestamp", 1000_i64);
    event.set_value("source_short", "LOG");
    event.set_value("pathspec", &b"\x01\x02"[..]);
    event.set_value("note", "hello");
    event.set_value("empty", "");

    let decoded = decode_event(&encode_event(&event).unwrap()).unwrap();

    assert_eq!(decoded.timestamp(), Some(1000));
    assert_eq!(
        decoded.get_value("source_short").unwrap(),
        Value::from("LOG")
    );
    assert_eq!(
        decoded.get_value("pathspec").unwrap(),
        Value::from(&b"\x01\x02"[..])
    );
    assert_eq!(decoded.get_value("note").unwrap(), Value::from("hello"));
    assert!(matches!(
        decoded.get_value("empty"),
        Err(StoreError::AttributeNotFound { .. })
    ));
}

#[test]
fn test_inherited_attributes_are_materialized_into_the_message() {
    ensure_env_logger_initialized();
    let store = sample_store();

    let syslog_event = store.ordered_events().next().unwrap();
    let decoded = decode_event(&encode_event(&syslog_event).unwrap()).unwrap();

    assert!(decoded.parent().is_none());
    assert_eq!(decoded.resolved_attributes(), syslog_event.resolved_attributes());
    assert_eq!(
        decoded.get_value("hostname").unwrap(),
        Value::from("workstation-7")
    );
    assert_eq!(
        decoded.get_value("filename").unwrap(),
        Value::from("/var/log/syslog")
    );
}

#[test]
fn test_zero_and_false_are_not_dropped() {
    ensure_env_logger_initialized();

    let event = EventObject::new();
    event.set_value("timestamp", 1_i64);
    event.set_value("count", 0_i64);
    event.set_value("flag", false);

    let decoded = decode_event(&encode_event(&event).unwrap()).unwrap();

    assert_eq!(decoded.get_value("count").unwrap(), Value::Integer(0));
    assert_eq!(decoded.get_value("flag").unwrap(), Value::Boolean(false));
}

#[test]
fn test_nested_dict_and_array_values_round_trip() {
    ensure_env_logger_initialized();

    let event = registry_event(7);
    event.set_value(
        "mru_order",
        Value::Array(vec![
            Value::from("a"),
            Value::from(1_i64),
            Value::from(true),
        ]),
    );

    let decoded = decode_event(&encode_event(&event).unwrap()).unwrap();

    assert_eq!(
        decoded.get_value("regvalue").unwrap(),
        event.get_value("regvalue").unwrap()
    );
    assert_eq!(
        decoded.get_value("mru_order").unwrap(),
        event.get_value("mru_order").unwrap()
    );
}

#[test]
fn test_unknown_source_name_round_trips_as_log() {
    ensure_env_logger_initialized();

    let event = EventObject::new();
    event.set_value("timestamp", 1_i64);
    event.set_value("source_short", "NOSUCH");

    let decoded = decode_event(&encode_event(&event).unwrap()).unwrap();

    assert_eq!(
        decoded.get_value("source_short").unwrap(),
        Value::from("LOG")
    );
}

#[test]
fn test_encoding_is_deterministic_regardless_of_insertion_order() {
    ensure_env_logger_initialized();

    let first = EventObject::new();
    first.set_value("timestamp", 42_i64);
    first.set_value("alpha", "1");
    first.set_value("zeta", "2");

    let second = EventObject::new();
    second.set_value("zeta", "2");
    second.set_value("timestamp", 42_i64);
    second.set_value("alpha", "1");

    assert_eq!(encode_event(&first).unwrap(), encode_event(&second).unwrap());
}

#[test]
fn test_corrupt_messages_are_rejected() {
    ensure_env_logger_initialized();

    let event = text_event(1_281_647_191, "session opened");
    let message = encode_event(&event).unwrap();

    let mut bad_magic = message.clone();
    bad_magic[0] = b'X';
    assert!(matches!(
        decode_event(&bad_magic),
        Err(DeserializationError::UnsupportedMessageType { .. })
    ));

    let mut bad_version = message.clone();
    bad_version[4] = 99;
    assert!(matches!(
        decode_event(&bad_version),
        Err(DeserializationError::UnsupportedMessageType { .. })
    ));

    let mut flipped_body = message.clone();
    flipped_body[12] ^= 0x01;
    assert!(matches!(
        decode_event(&flipped_body),
        Err(DeserializationError::ChecksumMismatch { .. })
    ));

    assert!(matches!(
        decode_event(&message[..message.len() - 3]),
        Err(DeserializationError::Truncated { .. })
    ));

    let mut trailing = message.clone();
    trailing.push(0x00);
    assert!(matches!(
        decode_event(&trailing),
        Err(DeserializationError::UnsupportedMessageType { .. })
    ));
}

#[test]
fn test_checksum_validation_can_be_disabled() {
    ensure_env_logger_initialized();

    let event = text_event(1_281_647_191, "session opened");
    let mut message = encode_event(&event).unwrap();

    // Corrupt only the stored checksum; the body itself stays intact.
    let crc_offset = message.len() - 4;
    message[crc_offset] ^= 0xff;

    assert!(matches!(
        decode_event(&message),
        Err(DeserializationError::ChecksumMismatch { .. })
    ));

    let options = CodecOptions::new().validate_checksums(false);
    let decoded = decode_event_with_options(&message, &options).unwrap();
    assert_eq!(decoded.get_value("body").unwrap(), Value::from("session opened"));
}
