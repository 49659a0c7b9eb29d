/*!
 * SQLite handle for the translation cache.
 *
 * One `rusqlite::Connection` sits behind a mutex shared by every clone.
 * Async callers go through `spawn_blocking` so cache reads never stall the
 * request loop.
 */

use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::schema;

/// Folder under the local data directory that holds cache files
const CACHE_DIRNAME: &str = "bookwai";

/// Shared handle to the cache database
///
/// Clones share the same underlying handle, so a `reconnect` on any clone
/// is visible to all of them.
#[derive(Clone)]
pub struct DatabaseConnection {
    db_path: Arc<Mutex<PathBuf>>,
    connection: Arc<Mutex<Connection>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|e| anyhow::anyhow!("Cache database lock poisoned: {}", e))
}

impl DatabaseConnection {
    /// Opens (or creates) the cache file at `db_path`
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        let conn = Self::open_file(&db_path)?;

        Ok(Self {
            db_path: Arc::new(Mutex::new(db_path)),
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Cache that lives only as long as the process, used by estimates and tests
    pub fn new_in_memory() -> Result<Self> {
        debug!("Opening in-memory cache");

        let conn = Connection::open_in_memory().context("Could not open in-memory cache")?;
        schema::initialize_schema(&conn)?;

        Ok(Self {
            db_path: Arc::new(Mutex::new(PathBuf::from(":memory:"))),
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    fn open_file(db_path: &Path) -> Result<Connection> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Could not create cache directory {:?}", parent))?;
            }
        }

        info!("Opening cache database at: {:?}", db_path);

        let conn = Connection::open(db_path)
            .with_context(|| format!("Could not open cache database {:?}", db_path))?;
        schema::initialize_schema(&conn)?;

        Ok(conn)
    }

    /// Location of `file_name` inside the per-user cache folder
    pub fn default_database_path(file_name: &str) -> Result<PathBuf> {
        let base_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .ok_or_else(|| anyhow::anyhow!("No local data directory available for the cache"))?;

        Ok(base_dir.join(CACHE_DIRNAME).join(file_name))
    }

    /// File currently backing the cache
    pub fn path(&self) -> Result<PathBuf> {
        Ok(lock(&self.db_path)?.clone())
    }

    /// Close the current handle and switch to the database at `db_path`
    ///
    /// The file is created when missing and the cache tables are ensured.
    pub fn reconnect<P: AsRef<Path>>(&self, db_path: P) -> Result<()> {
        let db_path = db_path.as_ref().to_path_buf();
        let new_conn = Self::open_file(&db_path)?;

        // old handle drops here
        *lock(&self.connection)? = new_conn;
        *lock(&self.db_path)? = db_path;

        Ok(())
    }

    /// Runs `f` against the cache on the current thread
    pub fn execute<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = lock(&self.connection)?;
        f(&conn)
    }

    /// Runs `f` against the cache on the blocking pool
    pub async fn execute_async<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let shared = self.connection.clone();

        tokio::task::spawn_blocking(move || {
            let conn = lock(&shared)?;
            f(&conn)
        })
        .await
        .context("Cache query task panicked")?
    }

    /// Runs `f` inside one transaction on the blocking pool
    ///
    /// Nothing is committed when the closure fails.
    pub async fn transaction_async<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&rusqlite::Transaction) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let shared = self.connection.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = lock(&shared)?;
            let tx = conn.transaction()?;
            let value = f(&tx)?;
            tx.commit()?;
            Ok(value)
        })
        .await
        .context("Cache transaction task panicked")?
    }
}
