//! Body fetcher
//!
//! Fills `BodyHTML` for every known article slug. Never creates a schema.

use crate::crawler::{stage_of, ApiClient, RunContext, Throttle};
use crate::storage::{EventStage, Storage, Table};
use crate::Result;

/// Fetches the HTML body of every article in the `articles` table
///
/// Failing to list the slugs aborts the run, for instance when the table does
/// not exist yet. Every per-slug failure is skipped and recorded.
///
/// # Returns
///
/// The number of articles that have a body at the end of the run
pub async fn fetch_bodies<S: Storage, T: Throttle>(
    storage: &mut S,
    client: &ApiClient,
    throttle: &mut T,
    ctx: &mut RunContext,
) -> Result<u64> {
    let slugs: Vec<String> = storage.query_distinct(Table::Articles, "Slug")?;
    tracing::info!("Fetching bodies of {} articles", slugs.len());

    for slug in slugs {
        throttle.ready().await;
        ctx.counters.items_processed += 1;

        let body = match client.fetch_article_body(&slug).await {
            Ok(body) => body,
            Err(e) => {
                ctx.counters.items_skipped += 1;
                ctx.record_skip(storage, stage_of(&e), slug, e);
                continue;
            }
        };

        match storage.update_by_key(Table::Articles, "Slug", &slug, "BodyHTML", &body.body_html) {
            Ok(0) => tracing::debug!("No article matched slug {}", slug),
            Ok(_) => ctx.counters.rows_written += 1,
            Err(e) => {
                ctx.counters.items_skipped += 1;
                ctx.record_skip(storage, EventStage::Update, slug, e);
            }
        }
    }

    let total = storage.count_non_null(Table::Articles, "BodyHTML")?;
    tracing::info!("{} article bodies stored", total);

    Ok(total)
}
