use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::attributes::AttributeStore;
use crate::container::{ContainerData, EventContainer};
use crate::err::{StoreError, StoreResult};
use crate::timestamp;
use crate::value::{Value, ValueMap};

#[derive(Debug, Default)]
pub(crate) struct EventData {
    pub(crate) store: AttributeStore,
    pub(crate) parent: Option<Weak<RefCell<ContainerData>>>,
}

/// A single timestamped fact extracted from a source.
///
/// `EventObject` is a cheap handle; clones refer to the same event. Attribute
/// lookups fall back to the parent container chain, so attributes shared by
/// many events can be stored once on a container.
#[derive(Debug, Clone, Default)]
pub struct EventObject {
    pub(crate) inner: Rc<RefCell<EventData>>,
}

impl EventObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `self` and `other` are handles to the same event.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Sets a local attribute, overwriting any previous value.
    pub fn set_value(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.inner.borrow_mut().store.set_value(name, value);
    }

    /// Resolves an attribute locally first, then through the parent chain.
    pub fn get_value(&self, name: &str) -> StoreResult<Value> {
        if let Some(value) = self.local_value(name) {
            return Ok(value);
        }

        let mut next = self.parent();
        while let Some(container) = next {
            if let Some(value) = container.local_value(name) {
                return Ok(value);
            }
            next = container.parent();
        }

        Err(StoreError::AttributeNotFound {
            name: name.to_owned(),
        })
    }

    pub(crate) fn local_value(&self, name: &str) -> Option<Value> {
        self.inner.borrow().store.get(name).cloned()
    }

    /// The container this event was last appended to.
    pub fn parent(&self) -> Option<EventContainer> {
        self.inner
            .borrow()
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(EventContainer::from_inner)
    }

    pub(crate) fn set_parent(&self, parent: &EventContainer) {
        self.inner.borrow_mut().parent = Some(Rc::downgrade(&parent.inner));
    }

    /// Names of every attribute visible on this event, including inherited
    /// ones. Sorted and deduplicated.
    pub fn attributes(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .borrow()
            .store
            .iter()
            .map(|(name, _)| name.clone())
            .collect();

        if let Some(parent) = self.parent() {
            names.extend(parent.attributes());
        }

        names.sort_unstable();
        names.dedup();
        names
    }

    /// Resolved name and value pairs for every visible attribute, sorted by
    /// name. Local values shadow inherited ones.
    pub fn resolved_attributes(&self) -> Vec<(String, Value)> {
        let mut merged = ValueMap::default();
        for (name, value) in self.inner.borrow().store.iter() {
            merged.insert(name.clone(), value.clone());
        }

        let mut next = self.parent();
        while let Some(container) = next {
            container.merge_local_into(&mut merged);
            next = container.parent();
        }

        let mut entries: Vec<(String, Value)> = merged.into_iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// The event's effective timestamp in microseconds since the Unix epoch,
    /// when present and integral.
    pub fn timestamp(&self) -> Option<i64> {
        self.get_value("timestamp")
            .ok()
            .and_then(|value| value.as_integer())
    }

    /// Renders the resolved attribute union as a JSON object with sorted keys.
    pub fn to_json_value(&self) -> serde_json::Value {
        let entries = self.resolved_attributes();
        let mut map = serde_json::Map::with_capacity(entries.len());
        for (name, value) in entries {
            map.insert(name, serde_json::Value::from(&value));
        }
        serde_json::Value::Object(map)
    }

    /// Creates an event from a FAT date time, as found in FAT filesystems and
    /// their derivatives.
    pub fn from_fat_date_time(fat_date_time: u32, usage: impl Into<String>) -> Self {
        let event = Self::new();
        event.set_value("timestamp", timestamp::from_fat_date_time(fat_date_time));
        event.set_value("timestamp_desc", usage.into());
        event
    }

    /// Creates an event from a FILETIME value (100ns ticks since 1601-01-01).
    pub fn from_filetime(filetime: u64, usage: impl Into<String>) -> Self {
        let event = Self::new();
        event.set_value("timestamp", timestamp::from_filetime(filetime));
        event.set_value("timestamp_desc", usage.into());
        event
    }

    /// Creates an event from a POSIX timestamp in seconds.
    pub fn from_posix_time(posix_time: i64, usage: impl Into<String>) -> Self {
        let event = Self::new();
        event.set_value("timestamp", timestamp::from_posix_time(posix_time));
        event.set_value("timestamp_desc", usage.into());
        event
    }

    /// Creates a Windows Registry key event.
    ///
    /// `values` carries the key's values and lands in both `keyvalue_dict`
    /// and `regvalue`. `usage` defaults to `"Last Written"`.
    pub fn from_registry_key(
        key: &str,
        values: ValueMap,
        timestamp: i64,
        usage: Option<&str>,
    ) -> Self {
        let event = Self::new();
        event.set_value("source_short", "REG");
        if !key.is_empty() {
            event.set_value("keyname", key);
        }
        event.set_value("keyvalue_dict", Value::Dict(values.clone()));
        event.set_value("timestamp", timestamp);
        event.set_value("timestamp_desc", usage.unwrap_or("Last Written"));
        event.set_value("regvalue", Value::Dict(values));
        event
    }

    /// Creates a text log event. Empty string attributes are skipped; other
    /// empty values are kept and only dropped at encoding time.
    pub fn from_text_log(timestamp: i64, source: impl Into<String>, attributes: ValueMap) -> Self {
        let event = Self::new();
        event.set_value("timestamp", timestamp);
        event.set_value("timestamp_desc", "Entry Written");
        event.set_value("source_short", "LOG");
        event.set_value("source_long", source.into());
        for (name, value) in attributes {
            if value.as_str().is_some_and(str::is_empty) {
                continue;
            }
            event.set_value(name, value);
        }
        event
    }

    /// Creates an event from a SQLite database row; all fields are explicit.
    pub fn from_sqlite(
        timestamp: i64,
        usage: impl Into<String>,
        source_short: impl Into<String>,
        source_long: impl Into<String>,
    ) -> Self {
        let event = Self::new();
        event.set_value("timestamp", timestamp);
        event.set_value("timestamp_desc", usage.into());
        event.set_value("source_short", source_short.into());
        event.set_value("source_long", source_long.into());
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_get_value_falls_back_to_parent_chain() {
        let root = EventContainer::new();
        root.set_value("hostname", "acme-laptop");

        let inner = EventContainer::new();
        root.append(&inner).unwrap();

        let event = EventObject::new();
        event.set_value("timestamp", 1_000i64);
        inner.append(&event).unwrap();

        assert_eq!(
            event.get_value("hostname").unwrap(),
            Value::from("acme-laptop")
        );
        // The intermediate container resolves through the same chain.
        assert_eq!(
            inner.get_value("hostname").unwrap(),
            Value::from("acme-laptop")
        );
    }

    #[test]
    fn test_local_value_shadows_parent() {
        let root = EventContainer::new();
        root.set_value("username", "root");

        let event = EventObject::new();
        event.set_value("timestamp", 1i64);
        event.set_value("username", "operator");
        root.append(&event).unwrap();

        assert_eq!(event.get_value("username").unwrap(), Value::from("operator"));
    }

    #[test]
    fn test_missing_attribute_is_an_error() {
        let event = EventObject::new();
        let err = event.get_value("no_such_attribute").unwrap_err();
        assert!(matches!(err, StoreError::AttributeNotFound { name } if name == "no_such_attribute"));
    }

    #[test]
    fn test_attributes_union_is_sorted_and_deduplicated() {
        let root = EventContainer::new();
        root.set_value("hostname", "acme");
        root.set_value("username", "root");

        let event = EventObject::new();
        event.set_value("timestamp", 1i64);
        event.set_value("username", "operator");
        root.append(&event).unwrap();

        assert_eq!(
            event.attributes(),
            vec!["hostname".to_owned(), "timestamp".to_owned(), "username".to_owned()]
        );
    }

    #[test]
    fn test_registry_preset_sets_the_documented_fields() {
        let mut values = ValueMap::default();
        values.insert("MRUList".to_owned(), Value::from("a b c"));

        let event =
            EventObject::from_registry_key("HKCU\\Software\\Vendor", values, 1_300_000i64, None);

        assert_eq!(event.get_value("source_short").unwrap(), Value::from("REG"));
        assert_eq!(
            event.get_value("keyname").unwrap(),
            Value::from("HKCU\\Software\\Vendor")
        );
        assert_eq!(
            event.get_value("timestamp_desc").unwrap(),
            Value::from("Last Written")
        );
        assert_eq!(
            event.get_value("regvalue").unwrap(),
            event.get_value("keyvalue_dict").unwrap()
        );
    }

    #[test]
    fn test_registry_preset_skips_empty_key_name() {
        let event = EventObject::from_registry_key("", ValueMap::default(), 1i64, Some("Created"));
        assert!(event.get_value("keyname").is_err());
        assert_eq!(
            event.get_value("timestamp_desc").unwrap(),
            Value::from("Created")
        );
    }

    #[test]
    fn test_text_log_preset_skips_empty_strings_only() {
        let mut attributes = ValueMap::default();
        attributes.insert("body".to_owned(), Value::from("shutdown requested"));
        attributes.insert("comment".to_owned(), Value::from(""));
        attributes.insert("severity".to_owned(), Value::Integer(0));

        let event = EventObject::from_text_log(5_000i64, "syslog", attributes);

        assert_eq!(event.get_value("source_short").unwrap(), Value::from("LOG"));
        assert_eq!(
            event.get_value("timestamp_desc").unwrap(),
            Value::from("Entry Written")
        );
        assert!(event.get_value("comment").is_err());
        assert_eq!(event.get_value("severity").unwrap(), Value::Integer(0));
    }

    #[test]
    fn test_to_json_value_carries_inherited_attributes() {
        let root = EventContainer::new();
        root.set_value("hostname", "acme");

        let event = EventObject::new();
        event.set_value("timestamp", 42i64);
        event.set_value("pathspec", Value::Bytes(vec![0x01, 0xff]));
        root.append(&event).unwrap();

        assert_eq!(
            event.to_json_value(),
            json!({"hostname": "acme", "pathspec": "01FF", "timestamp": 42})
        );
    }
}
