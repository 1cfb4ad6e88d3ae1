//! Statistics generation from a harvest database
//!
//! This module provides functionality for extracting and displaying
//! harvest statistics from the storage layer.

use crate::storage::{EventStage, RunRecord, Storage, Table};
use crate::HarvestError;
use std::collections::HashMap;

/// Number of runs shown by default
pub const DEFAULT_RUN_LIMIT: usize = 10;

/// Harvest statistics summary
#[derive(Debug, Clone)]
pub struct HarvestStatistics {
    /// Rows in the articles table, `None` if it was never created
    pub articles: Option<u64>,

    /// Articles whose body has been fetched
    pub articles_with_body: Option<u64>,

    /// Rows in the comments table, `None` if it was never created
    pub comments: Option<u64>,

    /// Most recent runs, newest first
    pub runs: Vec<RunStatistics>,
}

/// One run together with its crawl event counts
#[derive(Debug, Clone)]
pub struct RunStatistics {
    pub run: RunRecord,
    pub events_by_stage: HashMap<EventStage, u64>,
}

impl RunStatistics {
    pub fn total_events(&self) -> u64 {
        self.events_by_stage.values().sum()
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `run_limit` - How many of the latest runs to include
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - Failed to query statistics
pub fn load_statistics<S: Storage>(
    storage: &S,
    run_limit: usize,
) -> Result<HarvestStatistics, HarvestError> {
    let (articles, articles_with_body) = if storage.has_table(Table::Articles)? {
        (
            Some(storage.count_rows(Table::Articles)?),
            Some(storage.count_non_null(Table::Articles, "BodyHTML")?),
        )
    } else {
        (None, None)
    };

    let comments = if storage.has_table(Table::Comments)? {
        Some(storage.count_rows(Table::Comments)?)
    } else {
        None
    };

    let mut runs = Vec::new();
    for run in storage.recent_runs(run_limit)? {
        let events_by_stage = storage.count_events_by_stage(run.id)?;
        runs.push(RunStatistics {
            run,
            events_by_stage,
        });
    }

    Ok(HarvestStatistics {
        articles,
        articles_with_body,
        comments,
        runs,
    })
}

fn count_or_missing(count: Option<u64>) -> String {
    match count {
        Some(n) => n.to_string(),
        None => "(table not created)".to_string(),
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Content:");
    println!("  Articles: {}", count_or_missing(stats.articles));
    println!(
        "  Articles with body: {}",
        count_or_missing(stats.articles_with_body)
    );
    println!("  Comments: {}", count_or_missing(stats.comments));
    println!();

    if let (Some(total), Some(with_body)) = (stats.articles, stats.articles_with_body) {
        let coverage = if total > 0 {
            (with_body as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        println!(
            "Body Coverage: {:.1}% ({} / {} articles)",
            coverage, with_body, total
        );
        println!();
    }

    if stats.runs.is_empty() {
        println!("No runs recorded");
        return;
    }

    println!("Recent Runs ({}):", stats.runs.len());
    for entry in &stats.runs {
        let run = &entry.run;
        println!(
            "  #{} {} [{}] started {}{}",
            run.id,
            run.pipeline,
            run.status.to_db_string(),
            run.started_at,
            run.finished_at
                .as_deref()
                .map(|f| format!(", finished {}", f))
                .unwrap_or_default()
        );
        println!(
            "      items: {}, rows written: {}, items skipped: {}, rows failed: {}",
            run.counters.items_processed,
            run.counters.rows_written,
            run.counters.items_skipped,
            run.counters.rows_failed
        );

        if entry.total_events() > 0 {
            let mut stage_counts: Vec<_> = entry.events_by_stage.iter().collect();
            stage_counts.sort_by(|a, b| b.1.cmp(a.1));

            let parts: Vec<String> = stage_counts
                .iter()
                .map(|(stage, count)| format!("{} {}", stage.to_db_string(), count))
                .collect();
            println!("      events: {}", parts.join(", "));
        }
    }
}
