//! SQLite database driver implementation
//!
//! Queries are normalized with `qbind-query` before they are prepared, and
//! every normalized parameter is bound to its `:name` slot on the statement.

mod binding;
mod connection;
mod driver;

pub use connection::{SqliteConnection, SqliteTransaction};
pub use driver::SqliteDriver;
