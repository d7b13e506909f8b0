//! Caller-supplied query parameters
//!
//! A `Parameters` bag holds values keyed either by 0-based position (consumed
//! by `?` placeholders in encounter order) or by name (looked up by `:name`
//! placeholders). Insertion order is preserved.

use indexmap::IndexMap;
use std::fmt;

use crate::Value;

/// Key of a single entry in a [`Parameters`] bag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamKey {
    /// 0-based position, consumed by `?` placeholders.
    Position(usize),
    /// Bare name (without the leading `:`), looked up by `:name` placeholders.
    Name(String),
}

impl From<usize> for ParamKey {
    fn from(position: usize) -> Self {
        ParamKey::Position(position)
    }
}

impl From<&str> for ParamKey {
    fn from(name: &str) -> Self {
        ParamKey::Name(name.to_string())
    }
}

impl From<String> for ParamKey {
    fn from(name: String) -> Self {
        ParamKey::Name(name)
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKey::Position(position) => write!(f, "{}", position),
            ParamKey::Name(name) => write!(f, "{}", name),
        }
    }
}

/// An ordered bag of positional and named parameter values.
///
/// # Example
///
/// ```
/// use qbind_core::{Parameters, Value};
///
/// let params = Parameters::new()
///     .bind("status", "active")
///     .bind("ids", vec![1i64, 2, 3]);
///
/// assert_eq!(params.get_named("status"), Some(&Value::String("active".into())));
/// assert!(params.get_named("ids").is_some_and(Value::is_array));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    values: IndexMap<ParamKey, Value>,
    next_position: usize,
}

impl Parameters {
    /// Create an empty parameter bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bag of positional values, numbered from 0 in iteration order
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        values
            .into_iter()
            .fold(Self::new(), |params, value| params.push(value))
    }

    /// Append a positional value at the next free position
    pub fn push(mut self, value: impl Into<Value>) -> Self {
        self.insert(ParamKey::Position(self.next_position), value);
        self
    }

    /// Add a named value, replacing any previous value of the same name
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(ParamKey::Name(name.into()), value);
        self
    }

    /// Insert a value under an explicit key, returning the value it replaced
    pub fn insert(&mut self, key: impl Into<ParamKey>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        if let ParamKey::Position(position) = key {
            self.next_position = self.next_position.max(position.saturating_add(1));
        }
        self.values.insert(key, value.into())
    }

    /// Look up the value for a `?` placeholder
    pub fn get_position(&self, position: usize) -> Option<&Value> {
        self.values.get(&ParamKey::Position(position))
    }

    /// Look up the value for a `:name` placeholder
    pub fn get_named(&self, name: &str) -> Option<&Value> {
        self.values.get(&ParamKey::Name(name.to_string()))
    }

    pub fn get(&self, key: &ParamKey) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParamKey, &Value)> {
        self.values.iter()
    }
}

impl From<Vec<Value>> for Parameters {
    fn from(values: Vec<Value>) -> Self {
        Self::positional(values)
    }
}

impl<K, V> FromIterator<(K, V)> for Parameters
where
    K: Into<ParamKey>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

impl<'a> IntoIterator for &'a Parameters {
    type Item = (&'a ParamKey, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, ParamKey, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
