use crate::value::{Value, ValueMap};

/// Named-value storage embedded in events and containers.
///
/// Lookups here are local only; the parent-chain fallback lives on the tree
/// handles.
#[derive(Debug, Clone, Default)]
pub struct AttributeStore {
    values: ValueMap,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites an attribute. Parent stores are never touched.
    pub fn set_value(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Locally defined attribute names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.values.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }
}
