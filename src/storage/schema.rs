//! Database schema definitions
//!
//! Article and comment tables are created by the pipeline that fills them.
//! Run bookkeeping tables are created whenever the database is opened.

use crate::storage::traits::{StorageError, StorageResult};

/// SQL schema for the `articles` table
pub const ARTICLES_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS articles (
    ID                      INTEGER PRIMARY KEY,
    PublicationID           INTEGER NOT NULL,
    Title                   TEXT NOT NULL,
    SocialTitle             TEXT NOT NULL,
    Slug                    TEXT UNIQUE NOT NULL,
    PostDate                TEXT NOT NULL,
    Audience                TEXT NOT NULL,
    WriteCommentPermissions TEXT NOT NULL,
    CanonicalURL            TEXT NOT NULL,
    CoverImage              TEXT NOT NULL,
    Description             TEXT NOT NULL,
    WordCount               INTEGER NOT NULL,
    CommentCount            INTEGER NOT NULL,
    ChildCommentCount       INTEGER NOT NULL,
    BodyHTML                TEXT,
    OriginalJSON            TEXT NOT NULL
);
"#;

/// SQL schema for the `comments` table
pub const COMMENTS_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS comments (
    ID            INTEGER PRIMARY KEY,
    PostID        INTEGER,
    UserID        INTEGER,
    Date          TEXT,
    Body          TEXT,
    Name          TEXT,
    AncestorPath  TEXT,
    ChildrenCount INTEGER,
    OriginalJSON  TEXT NOT NULL
);
"#;

/// SQL schema for run bookkeeping
pub const BOOKKEEPING_SCHEMA_SQL: &str = r#"
-- One row per pipeline run
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    pipeline TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    items_processed INTEGER NOT NULL DEFAULT 0,
    rows_written INTEGER NOT NULL DEFAULT 0,
    items_skipped INTEGER NOT NULL DEFAULT 0,
    rows_failed INTEGER NOT NULL DEFAULT 0
);

-- Items and rows a run had to skip
CREATE TABLE IF NOT EXISTS crawl_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    pipeline TEXT NOT NULL,
    stage TEXT NOT NULL,
    item TEXT NOT NULL,
    message TEXT NOT NULL,
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_crawl_events_run ON crawl_events(run_id);
"#;

/// Tables holding harvested content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Articles,
    Comments,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Articles => "articles",
            Self::Comments => "comments",
        }
    }

    pub fn schema_sql(&self) -> &'static str {
        match self {
            Self::Articles => ARTICLES_SCHEMA_SQL,
            Self::Comments => COMMENTS_SCHEMA_SQL,
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::Articles => &[
                "ID",
                "PublicationID",
                "Title",
                "SocialTitle",
                "Slug",
                "PostDate",
                "Audience",
                "WriteCommentPermissions",
                "CanonicalURL",
                "CoverImage",
                "Description",
                "WordCount",
                "CommentCount",
                "ChildCommentCount",
                "BodyHTML",
                "OriginalJSON",
            ],
            Self::Comments => &[
                "ID",
                "PostID",
                "UserID",
                "Date",
                "Body",
                "Name",
                "AncestorPath",
                "ChildrenCount",
                "OriginalJSON",
            ],
        }
    }

    /// Rejects identifiers that are not part of this table's schema
    ///
    /// Column names end up inside SQL text, so only known ones are accepted.
    pub fn check_column(&self, column: &str) -> StorageResult<()> {
        if self.columns().contains(&column) {
            Ok(())
        } else {
            Err(StorageError::UnknownColumn {
                table: self.name(),
                column: column.to_string(),
            })
        }
    }
}

/// Creates the bookkeeping tables
pub fn initialize_bookkeeping(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(BOOKKEEPING_SCHEMA_SQL)
}
