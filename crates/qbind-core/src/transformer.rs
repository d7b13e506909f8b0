//! Value transformation between the application and a backend
//!
//! Some backends store text in a legacy character set, or need values reshaped
//! before binding. A `DataTransformer` is applied to every normalized parameter
//! right before it is bound, and to every cell read back from a result.

use crate::Value;

/// Converts values on their way into and out of a backend.
pub trait DataTransformer: Send + Sync {
    /// Transform a parameter value before it is bound
    fn encode(&self, value: &Value) -> Value;

    /// Transform a value read from a result row
    fn decode(&self, value: Value) -> Value;
}

/// A transformer that leaves values untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTransformer;

impl DataTransformer for PassthroughTransformer {
    fn encode(&self, value: &Value) -> Value {
        value.clone()
    }

    fn decode(&self, value: Value) -> Value {
        value
    }
}
