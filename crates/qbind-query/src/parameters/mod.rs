//! SQL Placeholder Tokenization and Normalization
//!
//! This module splits a query into placeholder-aware tokens and rewrites it so
//! that a driver can bind every value by name. Two placeholder styles are
//! understood:
//!
//! - Positional parameters: `?`, rewritten to `:param_1`, `:param_2`, ...
//! - Named parameters: `:name`, kept as-is or suffixed when repeated
//!
//! Array values expand into one placeholder per element. Placeholders inside
//! quoted strings, and `::` type casts, are left alone.
//!
//! # Example
//!
//! ```
//! use qbind_core::Parameters;
//! use qbind_query::parameters::normalize;
//!
//! let params = Parameters::new().bind("ids", vec![10i64, 20, 30]);
//! let normalized = normalize("SELECT * FROM users WHERE id IN (:ids)", &params).unwrap();
//!
//! assert_eq!(normalized.query(), "SELECT * FROM users WHERE id IN (:ids_1, :ids_2, :ids_3)");
//! assert_eq!(normalized.parameters().len(), 3);
//! ```

mod normalizer;
mod token;
mod tokenizer;

pub use normalizer::{DefaultNormalizer, NormalizedQuery, QueryNormalizer, normalize};
pub use token::{Token, TokenKind};
pub use tokenizer::{QueryTokenizer, ScanningTokenizer, tokenize};

#[cfg(test)]
mod tests;
