//! Crawler module for harvesting a publication
//!
//! This module contains the harvesting logic, including:
//! - HTTP fetching and decoding of the three API endpoints
//! - Request pacing
//! - The article, comment and body pipelines
//! - Run coordination and bookkeeping

mod articles;
mod bodies;
mod comments;
mod coordinator;
mod fetcher;
mod throttle;

pub use articles::list_articles;
pub use bodies::fetch_bodies;
pub use comments::harvest_comments;
pub use coordinator::{Coordinator, RunReport};
pub use fetcher::{build_http_client, ApiClient};
pub use throttle::{FixedInterval, Throttle};

use crate::storage::{BatchOutcome, CrawlEvent, EventStage, RunCounters, Storage};
use crate::HarvestError;
use std::fmt;

/// The three harvesting pipelines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pipeline {
    Articles,
    Comments,
    Bodies,
}

impl Pipeline {
    /// Every pipeline, in the order a full harvest runs them
    pub const ALL: [Pipeline; 3] = [Pipeline::Articles, Pipeline::Comments, Pipeline::Bodies];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Articles => "articles",
            Self::Comments => "comments",
            Self::Bodies => "bodies",
        }
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State shared by a pipeline with its coordinator while it runs
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: i64,
    pub pipeline: Pipeline,
    pub counters: RunCounters,
}

impl RunContext {
    pub fn new(run_id: i64, pipeline: Pipeline) -> Self {
        Self {
            run_id,
            pipeline,
            counters: RunCounters::default(),
        }
    }

    /// Logs a skipped item or row and stores it as a crawl event
    ///
    /// Failing to store the event is logged and otherwise ignored.
    pub fn record_skip<S: Storage>(
        &self,
        storage: &mut S,
        stage: EventStage,
        item: impl Into<String>,
        message: impl fmt::Display,
    ) {
        let item = item.into();
        let message = message.to_string();
        tracing::warn!(
            "[{}] skipping {} ({}): {}",
            self.pipeline,
            item,
            stage.to_db_string(),
            message
        );

        let event = CrawlEvent {
            run_id: self.run_id,
            pipeline: self.pipeline.as_str().to_string(),
            stage,
            item,
            message,
        };
        if let Err(e) = storage.record_event(&event) {
            tracing::error!("Failed to record crawl event: {}", e);
        }
    }

    /// Books the outcome of a committed batch
    pub fn record_batch<S: Storage>(&mut self, storage: &mut S, outcome: &BatchOutcome) {
        self.counters.rows_written += outcome.inserted as u64;
        self.counters.rows_failed += outcome.failed.len() as u64;

        for failure in &outcome.failed {
            self.record_skip(storage, EventStage::Insert, failure.key.clone(), &failure.message);
        }
    }
}

/// Maps an item-level error to the stage it happened in
pub(crate) fn stage_of(error: &HarvestError) -> EventStage {
    match error {
        HarvestError::Decode { .. } => EventStage::Decode,
        HarvestError::Storage(_) => EventStage::Batch,
        _ => EventStage::Fetch,
    }
}
