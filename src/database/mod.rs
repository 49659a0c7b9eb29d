/*!
 * Database module for persistent storage of translations.
 *
 * This module provides SQLite-based persistence for:
 * - Batch-level translation cache (`split_cache`)
 * - Page-level translation cache (`page_cache`)
 * - Append-only log of rejected translations (`failed_cache`)
 */

pub mod schema;
pub mod connection;
pub mod repository;
pub mod models;

// Re-export main types
pub use connection::DatabaseConnection;
pub use models::{CacheScope, CacheTable, WriteOutcome};
pub use repository::Repository;
