//! Comment harvester
//!
//! Fetches the whole comment tree of every known article, flattens it and
//! stores one row per comment, one transaction per article.

use crate::crawler::{stage_of, ApiClient, RunContext, Throttle};
use crate::models::{flatten_comments, CommentRecord};
use crate::storage::{EventStage, Storage, Table};
use crate::Result;

/// Harvests the comments of every article in the `articles` table
///
/// Only creating the schema and listing the articles can abort the run. An
/// article whose comments cannot be fetched, decoded or committed is
/// skipped and recorded.
///
/// # Returns
///
/// The number of rows in `comments` at the end of the run
pub async fn harvest_comments<S: Storage, T: Throttle>(
    storage: &mut S,
    client: &ApiClient,
    throttle: &mut T,
    ctx: &mut RunContext,
) -> Result<u64> {
    storage.ensure_schema(Table::Comments)?;

    let article_ids: Vec<i64> = storage.query_distinct(Table::Articles, "ID")?;
    tracing::info!("Harvesting comments of {} articles", article_ids.len());

    for article_id in article_ids {
        throttle.ready().await;
        ctx.counters.items_processed += 1;

        let tree = match client.fetch_comment_tree(article_id).await {
            Ok(tree) => tree,
            Err(e) => {
                ctx.counters.items_skipped += 1;
                ctx.record_skip(storage, stage_of(&e), article_id.to_string(), e);
                continue;
            }
        };

        let flat = flatten_comments(&tree);
        let mut records = Vec::with_capacity(flat.len());
        for comment in flat {
            match CommentRecord::new(comment) {
                Ok(record) => records.push(record),
                Err(e) => {
                    ctx.counters.rows_failed += 1;
                    ctx.record_skip(
                        storage,
                        EventStage::Serialize,
                        format!("comment {}", comment.id),
                        e,
                    );
                }
            }
        }

        match storage.insert_batch(&records) {
            Ok(outcome) => {
                tracing::debug!(
                    "Article {}: {} of {} comments stored",
                    article_id,
                    outcome.inserted,
                    records.len()
                );
                ctx.record_batch(storage, &outcome);
            }
            Err(e) => {
                ctx.counters.items_skipped += 1;
                ctx.record_skip(storage, EventStage::Batch, article_id.to_string(), e);
            }
        }
    }

    let total = storage.count_rows(Table::Comments)?;
    tracing::info!("{} comments stored", total);

    Ok(total)
}
