use super::typed_value::TypedValue;
use crate::core::errors::{EngineError, LookupKind};
use std::collections::btree_map::{self, BTreeMap};

/// String-keyed map of `TypedValue`s used for a component's inputs, states and outputs.
///
/// Reading through [`ValueMap::get_or_create`] inserts a zero value on a miss.
/// Iteration is ordered by key so runs are reproducible, but behavior functions
/// should not rely on any particular order. `clone()` copies every value.
#[derive(Debug, Clone, Default)]
pub struct ValueMap {
    entries: BTreeMap<String, TypedValue>,
}

impl ValueMap {
    /// Create a new empty map
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Look up `key`, inserting `TypedValue::default()` first if it is absent
    pub fn get_or_create(&mut self, key: &str) -> &mut TypedValue {
        self.entries.entry(key.to_string()).or_default()
    }

    pub fn get(&self, key: &str) -> Option<&TypedValue> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut TypedValue> {
        self.entries.get_mut(key)
    }

    /// Strict lookup: absent keys are an error
    pub fn require(&self, key: &str) -> Result<&TypedValue, EngineError> {
        self.entries
            .get(key)
            .ok_or_else(|| EngineError::not_found(LookupKind::Key, key))
    }

    /// Strict typed lookup
    pub fn require_as<T: 'static>(&self, key: &str) -> Result<&T, EngineError> {
        self.require(key)?.get::<T>()
    }

    /// Insert a typed value, replacing whatever was stored under `key`
    pub fn set<T: Send + Sync + Clone + 'static>(&mut self, key: &str, value: T) {
        self.insert(key, TypedValue::new(value));
    }

    pub fn insert(&mut self, key: &str, value: TypedValue) -> Option<TypedValue> {
        self.entries.insert(key.to_string(), value)
    }

    /// Remove `key`; absent keys are ignored
    pub fn erase(&mut self, key: &str) {
        self.entries.remove(key);
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, TypedValue> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Visit every entry, allowing the value to be replaced in place
    pub fn for_each<F>(&mut self, mut visitor: F)
    where
        F: FnMut(&str, &mut TypedValue),
    {
        for (key, value) in self.entries.iter_mut() {
            visitor(key, value);
        }
    }

    /// Like [`ValueMap::for_each`], stopping at the first error
    pub fn try_for_each<F>(&mut self, mut visitor: F) -> Result<(), EngineError>
    where
        F: FnMut(&str, &mut TypedValue) -> Result<(), EngineError>,
    {
        for (key, value) in self.entries.iter_mut() {
            visitor(key, value)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ValueMap {
    type Item = (&'a String, &'a TypedValue);
    type IntoIter = btree_map::Iter<'a, String, TypedValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<(String, TypedValue)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (String, TypedValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
