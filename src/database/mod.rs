/*!
 * Database module for persistent storage of the translation memory.
 *
 * This module provides SQLite-based persistence: connection handling and the
 * versioned schema. The cache semantics live in `translation::cache`.
 */

pub mod connection;
pub mod schema;

pub use connection::DatabaseConnection;
