//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::schema::Table;
use crate::storage::{BatchOutcome, CrawlEvent, EventStage, RunCounters, RunRecord, RunStatus};
use rusqlite::types::{FromSql, ToSql};
use rusqlite::Statement;
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to {stage} batch: {source}")]
    Batch {
        stage: &'static str,
        source: rusqlite::Error,
    },

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Unknown column {column} in table {table}")]
    UnknownColumn { table: &'static str, column: String },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A row that can be written by [`Storage::insert_batch`]
pub trait BatchRow {
    /// Parameterized insert statement, prepared once per batch
    const INSERT_SQL: &'static str;

    /// Identifies the row in logs and crawl events
    fn key(&self) -> String;

    /// Binds this row's values and executes the prepared insert
    fn execute(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize>;
}

/// Trait for storage backend implementations
///
/// This trait defines every database operation the pipelines need. The
/// storage handle is owned by one pipeline at a time, so writes take
/// `&mut self`.
pub trait Storage {
    // ===== Schema =====

    /// Creates a content table if it does not exist yet
    ///
    /// Calling this on an existing table leaves its rows untouched.
    fn ensure_schema(&self, table: Table) -> StorageResult<()>;

    /// Checks whether a content table has been created
    fn has_table(&self, table: Table) -> StorageResult<bool>;

    // ===== Content =====

    /// Inserts rows inside a single transaction
    ///
    /// One statement is prepared and executed once per row. A row that fails
    /// (duplicate key, constraint violation) is reported in the outcome and
    /// does not affect the others. Failing to begin, prepare or commit
    /// returns an error and leaves none of the batch visible.
    fn insert_batch<R: BatchRow>(&mut self, rows: &[R]) -> StorageResult<BatchOutcome>;

    /// Gets the distinct values of a column, in no particular order
    fn query_distinct<T: FromSql>(&self, table: Table, column: &str) -> StorageResult<Vec<T>>;

    /// Sets `column = value` on rows where `key_column = key_value`
    ///
    /// # Returns
    ///
    /// The number of rows affected (zero when no row matches)
    fn update_by_key<K: ToSql, V: ToSql>(
        &mut self,
        table: Table,
        key_column: &str,
        key_value: K,
        column: &str,
        value: V,
    ) -> StorageResult<usize>;

    /// Counts all rows of a table
    fn count_rows(&self, table: Table) -> StorageResult<u64>;

    /// Counts rows of a table where `column` is not NULL
    fn count_non_null(&self, table: Table, column: &str) -> StorageResult<u64>;

    // ===== Run Management =====

    /// Creates a new run in the `running` state
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, pipeline: &str, config_hash: &str) -> StorageResult<i64>;

    /// Marks a run as finished with its final status and counters
    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        counters: &RunCounters,
    ) -> StorageResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent runs, newest first
    fn recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>>;

    // ===== Crawl Events =====

    /// Records a skipped item or failed row
    fn record_event(&mut self, event: &CrawlEvent) -> StorageResult<()>;

    /// Gets all events of a run in recording order
    fn events_for_run(&self, run_id: i64) -> StorageResult<Vec<CrawlEvent>>;

    /// Counts the events of a run per stage
    fn count_events_by_stage(&self, run_id: i64) -> StorageResult<HashMap<EventStage, u64>>;
}
