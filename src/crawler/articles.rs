//! Article lister
//!
//! Walks the archive endpoint page by page from offset zero. The first empty
//! page ends the walk; each non-empty page is stored in one transaction.

use crate::crawler::{ApiClient, RunContext, Throttle};
use crate::storage::{Storage, Table};
use crate::Result;

/// Lists every article of the publication into the `articles` table
///
/// Any failure to fetch or decode a page, or to commit it, aborts the run.
/// Rows rejected by the database are skipped and recorded.
///
/// # Returns
///
/// The number of rows in `articles` once the archive is exhausted
pub async fn list_articles<S: Storage, T: Throttle>(
    storage: &mut S,
    client: &ApiClient,
    throttle: &mut T,
    ctx: &mut RunContext,
) -> Result<u64> {
    storage.ensure_schema(Table::Articles)?;

    let page_size = u64::from(client.page_size());
    let mut offset = 0;

    loop {
        throttle.ready().await;
        let records = client.fetch_listing_page(offset).await?;

        if records.is_empty() {
            tracing::debug!("No articles at offset {}, archive exhausted", offset);
            break;
        }

        let outcome = storage.insert_batch(&records)?;
        ctx.counters.items_processed += 1;
        ctx.record_batch(storage, &outcome);

        tracing::debug!(
            "Offset {}: {} of {} articles stored",
            offset,
            outcome.inserted,
            records.len()
        );

        offset += page_size;
    }

    let total = storage.count_rows(Table::Articles)?;
    tracing::info!("{} articles found", total);

    Ok(total)
}
