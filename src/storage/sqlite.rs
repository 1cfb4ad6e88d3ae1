//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::{initialize_bookkeeping, Table};
use crate::storage::traits::{BatchRow, Storage, StorageError, StorageResult};
use crate::storage::{
    BatchOutcome, CrawlEvent, EventStage, RowFailure, RunCounters, RunRecord, RunStatus,
};
use chrono::Utc;
use rusqlite::types::{FromSql, ToSql, Type};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates a database file
    ///
    /// Only the bookkeeping tables are created here; content tables are
    /// created by the pipelines through [`Storage::ensure_schema`].
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_bookkeeping(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_bookkeeping(&conn)?;
        Ok(Self { conn })
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        pipeline: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        config_hash: row.get(4)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(5)?)
            .unwrap_or(RunStatus::Failed),
        counters: RunCounters {
            items_processed: row.get::<_, i64>(6)? as u64,
            rows_written: row.get::<_, i64>(7)? as u64,
            items_skipped: row.get::<_, i64>(8)? as u64,
            rows_failed: row.get::<_, i64>(9)? as u64,
        },
    })
}

fn stage_from_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<EventStage> {
    let stage: String = row.get(idx)?;
    EventStage::from_db_string(&stage).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unknown event stage '{}'", stage).into(),
        )
    })
}

const RUN_COLUMNS: &str = "id, pipeline, started_at, finished_at, config_hash, status,
     items_processed, rows_written, items_skipped, rows_failed";

impl Storage for SqliteStorage {
    // ===== Schema =====

    fn ensure_schema(&self, table: Table) -> StorageResult<()> {
        self.conn.execute_batch(table.schema_sql())?;
        Ok(())
    }

    fn has_table(&self, table: Table) -> StorageResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table.name()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // ===== Content =====

    fn insert_batch<R: BatchRow>(&mut self, rows: &[R]) -> StorageResult<BatchOutcome> {
        let tx = self
            .conn
            .transaction()
            .map_err(|source| StorageError::Batch {
                stage: "begin",
                source,
            })?;

        let mut outcome = BatchOutcome::default();
        {
            let mut stmt = tx
                .prepare(R::INSERT_SQL)
                .map_err(|source| StorageError::Batch {
                    stage: "prepare",
                    source,
                })?;

            for row in rows {
                match row.execute(&mut stmt) {
                    Ok(_) => outcome.inserted += 1,
                    Err(e) => {
                        let key = row.key();
                        tracing::debug!("Insert failed for {}: {}", key, e);
                        outcome.failed.push(RowFailure {
                            key,
                            message: e.to_string(),
                        });
                    }
                }
            }
        }

        // A failed commit drops the transaction, which rolls it back
        tx.commit().map_err(|source| StorageError::Batch {
            stage: "commit",
            source,
        })?;

        Ok(outcome)
    }

    fn query_distinct<T: FromSql>(&self, table: Table, column: &str) -> StorageResult<Vec<T>> {
        table.check_column(column)?;

        let sql = format!("SELECT DISTINCT {} FROM {}", column, table.name());
        let mut stmt = self.conn.prepare(&sql)?;

        let values = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<T>, _>>()?;

        Ok(values)
    }

    fn update_by_key<K: ToSql, V: ToSql>(
        &mut self,
        table: Table,
        key_column: &str,
        key_value: K,
        column: &str,
        value: V,
    ) -> StorageResult<usize> {
        table.check_column(key_column)?;
        table.check_column(column)?;

        let sql = format!(
            "UPDATE {} SET {} = ?1 WHERE {} = ?2",
            table.name(),
            column,
            key_column
        );
        let affected = self.conn.execute(&sql, params![value, key_value])?;

        Ok(affected)
    }

    fn count_rows(&self, table: Table) -> StorageResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.name());
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_non_null(&self, table: Table, column: &str) -> StorageResult<u64> {
        table.check_column(column)?;

        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {} IS NOT NULL",
            table.name(),
            column
        );
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Run Management =====

    fn create_run(&mut self, pipeline: &str, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (pipeline, started_at, config_hash, status) VALUES (?1, ?2, ?3, ?4)",
            params![pipeline, now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        counters: &RunCounters,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let affected = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, items_processed = ?3,
             rows_written = ?4, items_skipped = ?5, rows_failed = ?6 WHERE id = ?7",
            params![
                status.to_db_string(),
                now,
                counters.items_processed as i64,
                counters.rows_written as i64,
                counters.items_skipped as i64,
                counters.rows_failed as i64,
                run_id
            ],
        )?;

        if affected == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let sql = format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS);

        self.conn
            .query_row(&sql, params![run_id], run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>> {
        let sql = format!("SELECT {} FROM runs ORDER BY id DESC LIMIT ?1", RUN_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;

        let runs = stmt
            .query_map(params![limit as i64], run_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(runs)
    }

    // ===== Crawl Events =====

    fn record_event(&mut self, event: &CrawlEvent) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO crawl_events (run_id, pipeline, stage, item, message, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                event.run_id,
                event.pipeline,
                event.stage.to_db_string(),
                event.item,
                event.message,
                now
            ],
        )?;
        Ok(())
    }

    fn events_for_run(&self, run_id: i64) -> StorageResult<Vec<CrawlEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id, pipeline, stage, item, message FROM crawl_events
             WHERE run_id = ?1 ORDER BY id",
        )?;

        let events = stmt
            .query_map(params![run_id], |row| {
                Ok(CrawlEvent {
                    run_id: row.get(0)?,
                    pipeline: row.get(1)?,
                    stage: stage_from_column(row, 2)?,
                    item: row.get(3)?,
                    message: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(events)
    }

    fn count_events_by_stage(&self, run_id: i64) -> StorageResult<HashMap<EventStage, u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT stage, COUNT(*) FROM crawl_events WHERE run_id = ?1 GROUP BY stage")?;

        let rows = stmt.query_map(params![run_id], |row| {
            let stage: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok((stage, count))
        })?;

        let mut counts = HashMap::new();
        for row in rows {
            let (stage, count) = row?;
            if let Some(stage) = EventStage::from_db_string(&stage) {
                counts.insert(stage, count as u64);
            }
        }

        Ok(counts)
    }
}
