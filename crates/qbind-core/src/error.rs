//! Error types for QBind

use std::fmt;
use thiserror::Error;

/// Whether a placeholder was written as `?` or as `:name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
    Positional,
    Named,
}

/// Identifies the placeholder a normalization error refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlaceholderRef {
    /// A `?` placeholder, by its 0-based index among positional inputs.
    Positional(usize),
    /// A `:name` placeholder, by its bare name.
    Named(String),
}

impl PlaceholderRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn kind(&self) -> PlaceholderKind {
        match self {
            PlaceholderRef::Positional(_) => PlaceholderKind::Positional,
            PlaceholderRef::Named(_) => PlaceholderKind::Named,
        }
    }

    /// Returns the positional index if this refers to a `?` placeholder.
    pub fn index(&self) -> Option<usize> {
        match self {
            PlaceholderRef::Positional(index) => Some(*index),
            PlaceholderRef::Named(_) => None,
        }
    }

    /// Returns the bare name if this refers to a `:name` placeholder.
    pub fn name(&self) -> Option<&str> {
        match self {
            PlaceholderRef::Positional(_) => None,
            PlaceholderRef::Named(name) => Some(name),
        }
    }
}

impl fmt::Display for PlaceholderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaceholderRef::Positional(index) => {
                write!(f, "positional parameter at index {}", index)
            }
            PlaceholderRef::Named(name) => write!(f, "named parameter \"{}\"", name),
        }
    }
}

/// Errors raised while normalizing a query against its parameters.
///
/// Normalization stops at the first error; no partial query is ever returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// The query references a placeholder that has no supplied value.
    #[error("could not find a {0}")]
    MissingParameter(PlaceholderRef),

    /// An array value bound for expansion has no elements.
    #[error("could not expand an empty array for {0}")]
    EmptyExpansion(PlaceholderRef),

    /// An array value bound for expansion contains a non-scalar element.
    #[error("only scalar values are allowed in arrays ({placeholder}, element {index})")]
    NonScalarElement {
        placeholder: PlaceholderRef,
        index: usize,
    },

    /// Two placeholders in the output would share the same name.
    #[error("normalized parameter name \"{0}\" is produced more than once")]
    ParameterCollision(String),
}

impl NormalizeError {
    /// The placeholder this error refers to, if any.
    pub fn placeholder(&self) -> Option<&PlaceholderRef> {
        match self {
            NormalizeError::MissingParameter(placeholder)
            | NormalizeError::EmptyExpansion(placeholder)
            | NormalizeError::NonScalarElement { placeholder, .. } => Some(placeholder),
            NormalizeError::ParameterCollision(_) => None,
        }
    }
}

/// Core error type for QBind operations
#[derive(Error, Debug)]
pub enum QbindError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Normalization error: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type alias for QBind operations
pub type Result<T> = std::result::Result<T, QbindError>;
