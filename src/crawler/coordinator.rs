//! Harvest coordinator
//!
//! Owns the storage handle, the API client and the throttle, and wraps every
//! pipeline run with a row in the `runs` table:
//! - the run is created as `running` before the first request
//! - it ends as `completed` with its counters, or as `failed` with whatever
//!   counters were reached before the fatal error

use crate::config::Config;
use crate::crawler::{
    fetch_bodies, harvest_comments, list_articles, ApiClient, FixedInterval, Pipeline, RunContext,
    Throttle,
};
use crate::storage::{RunCounters, RunStatus, SqliteStorage, Storage};
use crate::Result;
use std::path::Path;

/// Summary of one finished pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: i64,
    pub pipeline: Pipeline,
    pub counters: RunCounters,
    /// Rows of the pipeline's target in the database after the run
    pub total_rows: u64,
}

impl RunReport {
    /// One-line human readable result, e.g. `12 articles found`
    pub fn summary(&self) -> String {
        match self.pipeline {
            Pipeline::Articles => format!("{} articles found", self.total_rows),
            Pipeline::Comments => format!("{} comments stored", self.total_rows),
            Pipeline::Bodies => format!("{} article bodies stored", self.total_rows),
        }
    }
}

/// Main harvest coordinator
pub struct Coordinator<S: Storage = SqliteStorage, T: Throttle = FixedInterval> {
    storage: S,
    client: ApiClient,
    throttle: T,
    config_hash: String,
}

impl Coordinator {
    /// Creates a coordinator backed by a database file
    ///
    /// # Arguments
    ///
    /// * `config` - The harvester configuration
    /// * `config_hash` - Hash recorded with every run
    /// * `database` - Path of the SQLite file, created if missing
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Storage opened and HTTP client built
    /// * `Err(HarvestError)` - Either of them failed
    pub fn new(config: &Config, config_hash: impl Into<String>, database: &Path) -> Result<Self> {
        let storage = SqliteStorage::new(database)?;
        let client = ApiClient::new(config)?;
        let throttle = FixedInterval::new(config.crawler.request_delay());

        tracing::debug!(
            "Opened {} with a request delay of {:?}",
            database.display(),
            throttle.interval()
        );

        Ok(Self::with_parts(storage, client, throttle, config_hash))
    }
}

impl<S: Storage, T: Throttle> Coordinator<S, T> {
    pub fn with_parts(
        storage: S,
        client: ApiClient,
        throttle: T,
        config_hash: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            client,
            throttle,
            config_hash: config_hash.into(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Runs one pipeline to completion
    pub async fn run(&mut self, pipeline: Pipeline) -> Result<RunReport> {
        let run_id = self
            .storage
            .create_run(pipeline.as_str(), &self.config_hash)?;
        let mut ctx = RunContext::new(run_id, pipeline);

        tracing::info!("Starting {} run {}", pipeline, run_id);

        let result = match pipeline {
            Pipeline::Articles => {
                list_articles(&mut self.storage, &self.client, &mut self.throttle, &mut ctx).await
            }
            Pipeline::Comments => {
                harvest_comments(&mut self.storage, &self.client, &mut self.throttle, &mut ctx)
                    .await
            }
            Pipeline::Bodies => {
                fetch_bodies(&mut self.storage, &self.client, &mut self.throttle, &mut ctx).await
            }
        };

        match result {
            Ok(total_rows) => {
                self.storage
                    .finish_run(run_id, RunStatus::Completed, &ctx.counters)?;

                tracing::info!(
                    "Finished {} run {}: {} items, {} rows written, {} items skipped, {} rows failed",
                    pipeline,
                    run_id,
                    ctx.counters.items_processed,
                    ctx.counters.rows_written,
                    ctx.counters.items_skipped,
                    ctx.counters.rows_failed
                );

                Ok(RunReport {
                    run_id,
                    pipeline,
                    counters: ctx.counters,
                    total_rows,
                })
            }
            Err(e) => {
                if let Err(finish_err) =
                    self.storage
                        .finish_run(run_id, RunStatus::Failed, &ctx.counters)
                {
                    tracing::error!("Failed to mark run {} as failed: {}", run_id, finish_err);
                }
                Err(e)
            }
        }
    }

    /// Runs the article, comment and body pipelines in that order
    ///
    /// Stops at the first pipeline that fails.
    pub async fn run_all(&mut self) -> Result<Vec<RunReport>> {
        let mut reports = Vec::with_capacity(Pipeline::ALL.len());
        for pipeline in Pipeline::ALL {
            reports.push(self.run(pipeline).await?);
        }
        Ok(reports)
    }
}
