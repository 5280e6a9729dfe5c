/*!
 * Database module for the persistent translation cache.
 *
 * This module provides the SQLite connection wrapper and the cache schema.
 * The cache survives across runs so a subtitle line is sent to the
 * translation service at most once.
 */

pub mod connection;
pub mod schema;

// Re-export main types
pub use connection::DatabaseConnection;
