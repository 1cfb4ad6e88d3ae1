//! Storage module for persisting harvested data
//!
//! This module handles all database operations for the harvester, including:
//! - SQLite database initialization and schema management
//! - Batched, transactional inserts of articles and comments
//! - Distinct lookups and keyed updates used by the follow-up pipelines
//! - Run and crawl event bookkeeping

mod rows;
mod schema;
mod sqlite;
mod traits;

pub use schema::Table;
pub use sqlite::SqliteStorage;
pub use traits::{BatchRow, Storage, StorageError, StorageResult};

use std::path::Path;

/// Opens or creates a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully opened storage
/// * `Err(StorageError)` - Failed to open the file or create bookkeeping tables
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Result of one [`Storage::insert_batch`] call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Rows written by the committed transaction
    pub inserted: usize,

    /// Rows that were skipped, in batch order
    pub failed: Vec<RowFailure>,
}

/// A row the batch had to skip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    pub key: String,
    pub message: String,
}

/// Represents a pipeline run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub pipeline: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub counters: RunCounters,
}

/// Progress counters kept for every run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    /// Pages, articles or slugs handled
    pub items_processed: u64,
    pub rows_written: u64,
    /// Items dropped as a whole (fetch, decode or batch failure)
    pub items_skipped: u64,
    /// Single rows dropped from an otherwise committed batch
    pub rows_failed: u64,
}

/// Status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Where in a pipeline an item or row was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventStage {
    Fetch,
    Decode,
    Serialize,
    Insert,
    Batch,
    Update,
}

impl EventStage {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Decode => "decode",
            Self::Serialize => "serialize",
            Self::Insert => "insert",
            Self::Batch => "batch",
            Self::Update => "update",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "fetch" => Some(Self::Fetch),
            "decode" => Some(Self::Decode),
            "serialize" => Some(Self::Serialize),
            "insert" => Some(Self::Insert),
            "batch" => Some(Self::Batch),
            "update" => Some(Self::Update),
            _ => None,
        }
    }
}

/// A skipped item or row, as stored in `crawl_events`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlEvent {
    pub run_id: i64,
    pub pipeline: String,
    pub stage: EventStage,
    /// Article ID, slug, page offset or row key
    pub item: String,
    pub message: String,
}
