use crate::common::{
    article_json, articles, coordinator, mount_archive, mount_listing, open_db, temp_database,
};
use acx_harvest::crawler::Pipeline;
use acx_harvest::storage::{EventStage, RunStatus, Storage, Table};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_lists_every_page_until_empty() {
    let server = MockServer::start().await;
    let (_dir, database) = temp_database();

    // 12 + 12 + 5, then an empty page at offset 36
    mount_archive(&server, articles(1..=29)).await;

    let mut coordinator = coordinator(&server, &database);
    let report = coordinator.run(Pipeline::Articles).await.unwrap();

    assert_eq!(report.total_rows, 29);
    assert_eq!(report.summary(), "29 articles found");
    assert_eq!(report.counters.items_processed, 3);
    assert_eq!(report.counters.rows_written, 29);
    assert_eq!(report.counters.rows_failed, 0);

    let run = coordinator.storage().get_run(report.run_id).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.pipeline, "articles");
    assert_eq!(run.config_hash, "test-hash");
    assert!(run.finished_at.is_some());
}

#[tokio::test]
async fn test_single_page_archive() {
    let server = MockServer::start().await;
    let (_dir, database) = temp_database();

    mount_archive(&server, articles(1..=12)).await;

    let mut coordinator = coordinator(&server, &database);
    let report = coordinator.run(Pipeline::Articles).await.unwrap();

    assert_eq!(report.summary(), "12 articles found");
}

#[tokio::test]
async fn test_empty_archive_creates_table() {
    let server = MockServer::start().await;
    let (_dir, database) = temp_database();

    mount_listing(&server, 0, json!([])).await;

    let mut coordinator = coordinator(&server, &database);
    let report = coordinator.run(Pipeline::Articles).await.unwrap();

    assert_eq!(report.summary(), "0 articles found");
    assert!(coordinator.storage().has_table(Table::Articles).unwrap());
}

#[tokio::test]
async fn test_stored_columns_and_original_json() {
    let server = MockServer::start().await;
    let (_dir, database) = temp_database();

    mount_archive(&server, vec![article_json(42, "the-answer")]).await;

    let mut coordinator = coordinator(&server, &database);
    coordinator.run(Pipeline::Articles).await.unwrap();
    drop(coordinator);

    let conn = open_db(&database);
    let (title, social_title, cover_image, word_count, body, original): (
        String,
        String,
        String,
        i64,
        Option<String>,
        String,
    ) = conn
        .query_row(
            "SELECT Title, SocialTitle, CoverImage, WordCount, BodyHTML, OriginalJSON
             FROM articles WHERE ID = 42",
            [],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            },
        )
        .unwrap();

    assert_eq!(title, "Post 42");
    assert_eq!(social_title, "");
    assert_eq!(cover_image, "");
    assert_eq!(word_count, 1500);
    assert_eq!(body, None);

    // Fields without a column survive in the stored JSON
    let original: Value = serde_json::from_str(&original).unwrap();
    assert_eq!(original["slug"], "the-answer");
    assert_eq!(original["reactions"]["❤"], 12);
    assert!(original["podcast_url"].is_null());
}

#[tokio::test]
async fn test_malformed_page_fails_run_and_keeps_earlier_pages() {
    let server = MockServer::start().await;
    let (_dir, database) = temp_database();

    mount_listing(&server, 0, Value::Array(articles(1..=12))).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/archive"))
        .and(query_param("offset", "12"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"not\": \"a list\""))
        .expect(1)
        .mount(&server)
        .await;

    let mut coordinator = coordinator(&server, &database);
    let result = coordinator.run(Pipeline::Articles).await;
    assert!(result.is_err());

    let storage = coordinator.storage();
    assert_eq!(storage.count_rows(Table::Articles).unwrap(), 12);

    let run = &storage.recent_runs(1).unwrap()[0];
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.counters.items_processed, 1);
    assert_eq!(run.counters.rows_written, 12);
}

#[tokio::test]
async fn test_server_error_fails_run() {
    let server = MockServer::start().await;
    let (_dir, database) = temp_database();

    Mock::given(method("GET"))
        .and(path("/api/v1/archive"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut coordinator = coordinator(&server, &database);
    assert!(coordinator.run(Pipeline::Articles).await.is_err());

    let run = &coordinator.storage().recent_runs(1).unwrap()[0];
    assert_eq!(run.status, RunStatus::Failed);
}

#[tokio::test]
async fn test_rerun_skips_existing_articles() {
    let server = MockServer::start().await;
    let (_dir, database) = temp_database();

    let items = articles(1..=5);
    mount_archive(&server, items.clone()).await;

    let mut first = coordinator(&server, &database);
    first.run(Pipeline::Articles).await.unwrap();
    drop(first);

    let server = MockServer::start().await;
    mount_archive(&server, items).await;

    let mut second = coordinator(&server, &database);
    let report = second.run(Pipeline::Articles).await.unwrap();

    assert_eq!(report.total_rows, 5);
    assert_eq!(report.counters.rows_written, 0);
    assert_eq!(report.counters.rows_failed, 5);

    let events = second.storage().events_for_run(report.run_id).unwrap();
    assert_eq!(events.len(), 5);
    assert!(events.iter().all(|e| e.stage == EventStage::Insert));
    assert_eq!(events[0].item, "article 1 (post-1)");
}

#[tokio::test]
async fn test_sends_configured_user_agent() {
    let server = MockServer::start().await;
    let (_dir, database) = temp_database();

    Mock::given(method("GET"))
        .and(path("/api/v1/archive"))
        .and(header("user-agent", "TestBot/1.0.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let mut coordinator = coordinator(&server, &database);
    coordinator.run(Pipeline::Articles).await.unwrap();
}
