/*!
 * Database schema definitions.
 *
 * The cache tables are created idempotently on every open so that cache
 * files written by older releases, which carry no version row, keep working.
 */

use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::Connection;

/// Layout revision stored in `schema_version`
pub const SCHEMA_VERSION: i32 = 1;

/// Ensures the cache tables exist and records the layout revision
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    create_cache_tables(conn)?;

    let stored = stored_version(conn)?;
    if stored < SCHEMA_VERSION {
        info!("Initializing cache schema v{}", SCHEMA_VERSION);
        record_version(conn, SCHEMA_VERSION)?;
    } else {
        debug!("Cache schema is up to date (v{})", stored);
    }

    Ok(())
}

/// Missing table or row reads as revision 0
fn stored_version(conn: &Connection) -> Result<i32> {
    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .unwrap_or(0);

    Ok(version)
}

fn record_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version, updated_at) VALUES (1, ?1, datetime('now'))",
        [version],
    )?;
    Ok(())
}

fn create_cache_tables(conn: &Connection) -> Result<()> {
    // WAL keeps readers unblocked while a batch result is committed
    conn.execute_batch("PRAGMA journal_mode=WAL;")
        .context("Failed to enable WAL mode")?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS split_cache (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            target TEXT,
            engine TEXT,
            model TEXT,
            original TEXT,
            trans TEXT
        );

        CREATE TABLE IF NOT EXISTS page_cache (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            target TEXT,
            engine TEXT,
            model TEXT,
            original TEXT,
            trans TEXT
        );

        CREATE TABLE IF NOT EXISTS failed_cache (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            target TEXT,
            engine TEXT,
            model TEXT,
            original TEXT,
            trans TEXT,
            time TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_split_cache_lookup ON split_cache(target, engine, model, original);
        CREATE INDEX IF NOT EXISTS idx_page_cache_lookup ON page_cache(target, engine, model, original);
        "#,
    )
    .context("Failed to create cache tables")?;

    Ok(())
}
