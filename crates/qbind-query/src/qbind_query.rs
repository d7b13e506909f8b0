//! Query normalization for QBind
//!
//! Turns a SQL template written with `?` and `:name` placeholders, plus a bag
//! of parameter values, into a query that uses uniquely named placeholders only
//! and a flat, ordered parameter map ready for name-based binding.

pub mod parameters;

pub use parameters::{
    DefaultNormalizer, NormalizedQuery, QueryNormalizer, QueryTokenizer, ScanningTokenizer, Token,
    TokenKind, normalize, tokenize,
};
