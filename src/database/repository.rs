/*!
 * Repository layer for cache operations.
 *
 * Rows are addressed by (target, engine, model, serialized original) with
 * exact string equality. `split_cache` and `page_cache` hold at most one
 * row per key; `failed_cache` only ever grows.
 */

use anyhow::Result;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};

use super::connection::DatabaseConnection;
use super::models::{
    deserialize_paragraphs, serialize_paragraphs, CacheRecord, CacheScope, CacheTable,
    FailedRecord, WriteOutcome,
};

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    /// Underlying connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Look up a translation by exact original content
    pub async fn lookup(
        &self,
        table: CacheTable,
        scope: &CacheScope,
        original: &[String],
    ) -> Result<Option<Vec<String>>> {
        let scope = scope.clone();
        let original = serialize_paragraphs(original)?;

        self.db
            .execute_async(move |conn| {
                let column = Self::lookup_sync(conn, table, &scope, &original)?;
                column.map(|c| deserialize_paragraphs(&c)).transpose()
            })
            .await
    }

    fn lookup_sync(
        conn: &Connection,
        table: CacheTable,
        scope: &CacheScope,
        original: &str,
    ) -> Result<Option<String>> {
        let sql = format!(
            "SELECT trans FROM {} WHERE target = ?1 AND engine = ?2 AND model = ?3 AND original = ?4 ORDER BY id LIMIT 1",
            table.table_name()
        );
        let result = conn
            .query_row(
                &sql,
                params![scope.target, scope.engine, scope.model, original],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(result)
    }

    /// Store a translation in `split_cache` or `page_cache`
    ///
    /// Empty originals are ignored. An existing row is left untouched unless
    /// `allow_overwrite` is set, in which case its translation is replaced.
    pub async fn write(
        &self,
        table: CacheTable,
        scope: &CacheScope,
        original: &[String],
        trans: &[String],
        allow_overwrite: bool,
    ) -> Result<WriteOutcome> {
        if original.is_empty() {
            return Ok(WriteOutcome::Skipped);
        }
        if table == CacheTable::FailedCache {
            return Err(anyhow::anyhow!(
                "failed_cache is append-only, use append_failed instead"
            ));
        }

        let scope = scope.clone();
        let original = serialize_paragraphs(original)?;
        let trans = serialize_paragraphs(trans)?;

        self.db
            .transaction_async(move |tx| {
                let existing = Self::lookup_sync(tx, table, &scope, &original)?;
                match existing {
                    Some(_) if !allow_overwrite => {
                        debug!("{} already holds this content, skipping write", table);
                        Ok(WriteOutcome::Skipped)
                    }
                    Some(_) => {
                        let sql = format!(
                            "UPDATE {} SET trans = ?1 WHERE target = ?2 AND engine = ?3 AND model = ?4 AND original = ?5",
                            table.table_name()
                        );
                        tx.execute(
                            &sql,
                            params![trans, scope.target, scope.engine, scope.model, original],
                        )?;
                        Ok(WriteOutcome::Updated)
                    }
                    None => {
                        let sql = format!(
                            "INSERT INTO {} (target, engine, model, original, trans) VALUES (?1, ?2, ?3, ?4, ?5)",
                            table.table_name()
                        );
                        tx.execute(
                            &sql,
                            params![scope.target, scope.engine, scope.model, original, trans],
                        )?;
                        Ok(WriteOutcome::Inserted)
                    }
                }
            })
            .await
    }

    /// Append a rejected translation to `failed_cache`
    pub async fn append_failed(&self, record: &FailedRecord) -> Result<()> {
        if record.original.is_empty() {
            return Ok(());
        }

        let original = serialize_paragraphs(&record.original)?;
        let trans = serialize_paragraphs(&record.trans)?;
        let record = record.clone();

        self.db
            .transaction_async(move |tx| {
                tx.execute(
                    r#"
                    INSERT INTO failed_cache (target, engine, model, original, trans, time)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    "#,
                    params![
                        record.target,
                        record.engine,
                        record.model,
                        original,
                        trans,
                        record.time,
                    ],
                )?;
                Ok(())
            })
            .await
    }

    /// Read every row of a content table (used for inspection and tests)
    pub async fn records(&self, table: CacheTable) -> Result<Vec<CacheRecord>> {
        self.db
            .execute_async(move |conn| {
                let sql = format!(
                    "SELECT target, engine, model, original, trans FROM {} ORDER BY id",
                    table.table_name()
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, String>(4)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                rows.into_iter()
                    .map(|(target, engine, model, original, trans)| {
                        Ok(CacheRecord {
                            target,
                            engine,
                            model,
                            original: deserialize_paragraphs(&original)?,
                            trans: deserialize_paragraphs(&trans)?,
                        })
                    })
                    .collect()
            })
            .await
    }

    /// Number of rows in a table
    pub async fn count(&self, table: CacheTable) -> Result<usize> {
        self.db
            .execute_async(move |conn| {
                let sql = format!("SELECT COUNT(*) FROM {}", table.table_name());
                let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
                Ok(count as usize)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraphs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_write_twiceWithoutOverwrite_shouldKeepFirstValue() {
        let repo = Repository::new_in_memory().unwrap();
        let scope = CacheScope::new("French", "gpt-4");
        let original = paragraphs(&["hello"]);

        let first = repo
            .write(CacheTable::SplitCache, &scope, &original, &paragraphs(&["bonjour"]), false)
            .await
            .unwrap();
        let second = repo
            .write(CacheTable::SplitCache, &scope, &original, &paragraphs(&["salut"]), false)
            .await
            .unwrap();

        assert_eq!(first, WriteOutcome::Inserted);
        assert_eq!(second, WriteOutcome::Skipped);
        let found = repo.lookup(CacheTable::SplitCache, &scope, &original).await.unwrap();
        assert_eq!(found, Some(paragraphs(&["bonjour"])));
        assert_eq!(repo.count(CacheTable::SplitCache).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_write_withOverwrite_shouldReplaceValue() {
        let repo = Repository::new_in_memory().unwrap();
        let scope = CacheScope::new("French", "gpt-4");
        let original = paragraphs(&["hello"]);

        repo.write(CacheTable::PageCache, &scope, &original, &paragraphs(&["bonjour"]), false)
            .await
            .unwrap();
        let outcome = repo
            .write(CacheTable::PageCache, &scope, &original, &paragraphs(&["salut"]), true)
            .await
            .unwrap();

        assert_eq!(outcome, WriteOutcome::Updated);
        let found = repo.lookup(CacheTable::PageCache, &scope, &original).await.unwrap();
        assert_eq!(found, Some(paragraphs(&["salut"])));
    }

    #[tokio::test]
    async fn test_write_withEmptyOriginal_shouldSkip() {
        let repo = Repository::new_in_memory().unwrap();
        let scope = CacheScope::new("French", "gpt-4");

        let outcome = repo
            .write(CacheTable::SplitCache, &scope, &[], &[], false)
            .await
            .unwrap();

        assert_eq!(outcome, WriteOutcome::Skipped);
        assert_eq!(repo.count(CacheTable::SplitCache).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_lookup_withDifferentModel_shouldMiss() {
        let repo = Repository::new_in_memory().unwrap();
        let original = paragraphs(&["hello"]);
        repo.write(
            CacheTable::SplitCache,
            &CacheScope::new("French", "gpt-4"),
            &original,
            &paragraphs(&["bonjour"]),
            false,
        )
        .await
        .unwrap();

        let found = repo
            .lookup(CacheTable::SplitCache, &CacheScope::new("French", "gpt-3.5-turbo"), &original)
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_appendFailed_twice_shouldKeepBothRows() {
        let repo = Repository::new_in_memory().unwrap();
        let record = FailedRecord {
            target: "French".to_string(),
            engine: "openai".to_string(),
            model: "gpt-4".to_string(),
            original: paragraphs(&["a", "b"]),
            trans: paragraphs(&["x"]),
            time: "2024-01-01 00:00:00".to_string(),
        };

        repo.append_failed(&record).await.unwrap();
        repo.append_failed(&record).await.unwrap();

        assert_eq!(repo.count(CacheTable::FailedCache).await.unwrap(), 2);
    }
}
