//! QBind Core - Core abstractions and traits for query normalization and binding
//!
//! This crate provides the fundamental traits and types that all other
//! QBind crates depend on. It defines:
//!
//! - `Value` - A database value (scalar, NULL, JSON or an array for expansion)
//! - `Parameters` - The caller-supplied bag of positional and named values
//! - `DatabaseDriver`, `Connection`, `Transaction` - Traits for driver implementations
//! - `DataTransformer` - Hook for backend-specific value encoding
//! - `NormalizeError`, `QbindError` - Error taxonomy

mod config;
mod connection;
mod driver;
mod error;
mod params;
mod transformer;
mod types;

pub use config::*;
pub use connection::*;
pub use driver::*;
pub use error::*;
pub use params::*;
pub use transformer::*;
pub use types::*;
