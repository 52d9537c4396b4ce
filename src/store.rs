//! In-memory property value storage.

use std::collections::HashMap;

use crate::types::PropertyKey;

/// Holds the current property values for the device's objects.
///
/// Values live in three disjoint maps keyed by value kind; a key written
/// into one map is invisible to lookups against the others, and there is no
/// implicit conversion between kinds. A missing key is a normal outcome
/// ("this property does not exist on this object"), not an error.
#[derive(Debug, Default)]
pub struct PropertyStore {
    reals: HashMap<PropertyKey, f32>,
    texts: HashMap<PropertyKey, String>,
    enums: HashMap<PropertyKey, u32>,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a Real (32-bit float) value.
    pub fn get_real(&self, key: PropertyKey) -> Option<f32> {
        self.reals.get(&key).copied()
    }

    /// Looks up a CharacterString value.
    pub fn get_text(&self, key: PropertyKey) -> Option<&str> {
        self.texts.get(&key).map(String::as_str)
    }

    /// Looks up an Enumerated value.
    pub fn get_enum(&self, key: PropertyKey) -> Option<u32> {
        self.enums.get(&key).copied()
    }

    /// Stores a Real value, returning the previous one if any.
    pub fn set_real(&mut self, key: PropertyKey, value: f32) -> Option<f32> {
        self.reals.insert(key, value)
    }

    /// Stores a CharacterString value, returning the previous one if any.
    pub fn set_text(&mut self, key: PropertyKey, value: impl Into<String>) -> Option<String> {
        self.texts.insert(key, value.into())
    }

    /// Stores an Enumerated value, returning the previous one if any.
    pub fn set_enum(&mut self, key: PropertyKey, value: u32) -> Option<u32> {
        self.enums.insert(key, value)
    }
}
