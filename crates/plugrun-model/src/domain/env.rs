use serde::{Deserialize, Serialize};

use crate::KeyValue;

/// Ordered list of environment assignments handed to a plugin.
///
/// Duplicates are allowed; the last entry for a key wins, matching how
/// `execve` consumers and container engines resolve repeated variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Env(pub Vec<KeyValue>);

impl Env {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyValue> {
        self.0.iter()
    }

    /// Get the effective value for a key (last matching entry).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|kv| kv.key() == key)
            .map(|kv| kv.value())
    }

    /// Append an assignment; it overrides earlier entries with the same key.
    pub fn push<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.0.push(KeyValue::new(key, value));
    }

    /// Builder-style [`Env::push`].
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.push(key, value);
        self
    }

    /// Render as `KEY=VALUE` strings, preserving order and duplicates.
    ///
    /// This is the shape container engines expect in their create request.
    pub fn to_assignments(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}
