//! Fixed message schema: the scalar fields promoted out of the dynamic
//! attribute section, and the short source code table.
//!
//! Tags and codes are part of the wire format and must never be reassigned.

/// Payload shape of a fixed schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldKind {
    Str,
    I64,
    Source,
    Bytes,
}

/// Fixed fields, as `(tag, attribute name, payload kind)`.
pub(crate) const FIXED_FIELDS: &[(u8, &str, FieldKind)] = &[
    (0x01, "timestamp", FieldKind::I64),
    (0x02, "timestamp_desc", FieldKind::Str),
    (0x03, "data_type", FieldKind::Str),
    (0x04, "source_short", FieldKind::Source),
    (0x05, "source_long", FieldKind::Str),
    (0x06, "pathspec", FieldKind::Bytes),
    (0x07, "filename", FieldKind::Str),
    (0x08, "display_name", FieldKind::Str),
    (0x09, "hostname", FieldKind::Str),
    (0x0a, "username", FieldKind::Str),
    (0x0b, "inode", FieldKind::I64),
    (0x0c, "offset", FieldKind::I64),
    (0x0d, "store_number", FieldKind::I64),
    (0x0e, "store_index", FieldKind::I64),
];

pub(crate) fn fixed_field_by_name(name: &str) -> Option<(u8, FieldKind)> {
    FIXED_FIELDS
        .iter()
        .find(|&&(_, field, _)| field == name)
        .map(|&(tag, _, kind)| (tag, kind))
}

pub(crate) fn fixed_field_by_tag(tag: u8) -> Option<(&'static str, FieldKind)> {
    FIXED_FIELDS
        .iter()
        .find(|&&(field_tag, _, _)| field_tag == tag)
        .map(|&(_, name, kind)| (name, kind))
}

/// Tags of the dynamic value encoding.
pub(crate) const TAG_STRING: u8 = 0x01;
pub(crate) const TAG_INTEGER: u8 = 0x02;
pub(crate) const TAG_BOOLEAN: u8 = 0x03;
pub(crate) const TAG_BYTES: u8 = 0x04;
pub(crate) const TAG_DICT: u8 = 0x05;
pub(crate) const TAG_ARRAY: u8 = 0x06;

/// Code `6` is the reserved fallback for unknown source names and codes.
pub(crate) const DEFAULT_SOURCE_CODE: u8 = 6;
pub(crate) const DEFAULT_SOURCE_NAME: &str = "LOG";

/// Short source names and their one byte wire codes.
pub(crate) const SOURCE_CODES: &[(u8, &str)] = &[
    (1, "EVT"),
    (2, "EXIF"),
    (3, "FILE"),
    (4, "LNK"),
    (5, "LSO"),
    (6, "LOG"),
    (7, "META"),
    (8, "PLIST"),
    (9, "RECBIN"),
    (10, "REG"),
    (11, "TORRENT"),
    (12, "WEBHIST"),
];

pub(crate) fn source_code_for_name(name: &str) -> Option<u8> {
    SOURCE_CODES
        .iter()
        .find(|&&(_, source)| source == name)
        .map(|&(code, _)| code)
}

pub(crate) fn source_name_for_code(code: u8) -> Option<&'static str> {
    SOURCE_CODES
        .iter()
        .find(|&&(source_code, _)| source_code == code)
        .map(|&(_, name)| name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fixed_field_tags_and_names_are_unique() {
        for (i, &(tag, name, _)) in FIXED_FIELDS.iter().enumerate() {
            for &(other_tag, other_name, _) in &FIXED_FIELDS[i + 1..] {
                assert_ne!(tag, other_tag);
                assert_ne!(name, other_name);
            }
        }
    }

    #[test]
    fn test_source_table_is_bijective() {
        for &(code, name) in SOURCE_CODES {
            assert_eq!(source_code_for_name(name), Some(code));
            assert_eq!(source_name_for_code(code), Some(name));
        }
        assert_eq!(source_name_for_code(0), None);
        assert_eq!(source_name_for_code(13), None);
        assert_eq!(source_code_for_name("NOSUCH"), None);
    }

    #[test]
    fn test_default_source_is_in_the_table() {
        assert_eq!(
            source_name_for_code(DEFAULT_SOURCE_CODE),
            Some(DEFAULT_SOURCE_NAME)
        );
    }
}
