//! Session attribute storage.

use std::collections::hash_map;
use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Owned mapping of attribute names to values.
pub type AttributeMap = HashMap<String, Value>;

/// In-memory key-value store holding a session's attributes.
///
/// The store itself has no notion of lifecycle; [`Session`](super::Session)
/// gates every access on its state before delegating here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeStore {
    values: AttributeMap,
}

impl AttributeStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded from a persisted map.
    pub fn from_map(values: AttributeMap) -> Self {
        Self { values }
    }

    /// Get a value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Get a value by name, falling back to `default` when absent.
    pub fn get_or(&self, name: &str, default: Value) -> Value {
        self.values.get(name).cloned().unwrap_or(default)
    }

    /// Get a value deserialized into `T`.
    ///
    /// Returns `Ok(None)` when the attribute is absent.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> serde_json::Result<Option<T>> {
        self.values
            .get(name)
            .map(|value| T::deserialize(value))
            .transpose()
    }

    /// Store a value, returning the previous one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(name.into(), value.into())
    }

    /// Check whether an attribute exists.
    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Remove an attribute, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    /// Remove every attribute.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Snapshot of all attributes.
    ///
    /// The returned map is a copy; later writes to the store are not
    /// visible through it.
    pub fn all(&self) -> AttributeMap {
        self.values.clone()
    }

    /// Iterate over the stored attributes.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.values.iter(),
        }
    }

    /// Borrow the underlying map.
    pub(crate) fn as_map(&self) -> &AttributeMap {
        &self.values
    }
}

/// Borrowing iterator over `(name, value)` pairs of an [`AttributeStore`].
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    inner: hash_map::Iter<'a, String, Value>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(name, value)| (name.as_str(), value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a AttributeStore {
    type Item = (&'a str, &'a Value);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
