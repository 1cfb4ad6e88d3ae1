use crate::common::{
    article_json, comment_json, coordinator, mount_archive, mount_comments, open_db,
    temp_database,
};
use acx_harvest::crawler::{Coordinator, Pipeline};
use acx_harvest::storage::{EventStage, RunStatus, Storage, Table};
use serde_json::{json, Value};
use std::path::PathBuf;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Runs the article lister over two articles with IDs 10 and 20
async fn seed_articles(server: &MockServer, database: &PathBuf) -> Coordinator {
    mount_archive(
        server,
        vec![article_json(10, "first-post"), article_json(20, "second-post")],
    )
    .await;

    let mut coordinator = coordinator(server, database);
    coordinator.run(Pipeline::Articles).await.unwrap();
    coordinator
}

fn tree_for_post_10() -> Value {
    json!({
        "comments": [
            comment_json(1, 10, vec![
                comment_json(2, 10, vec![comment_json(3, 10, vec![])]),
            ]),
            comment_json(4, 10, vec![]),
        ]
    })
}

#[tokio::test]
async fn test_flattens_and_stores_comment_trees() {
    let server = MockServer::start().await;
    let (_dir, database) = temp_database();
    let mut coordinator = seed_articles(&server, &database).await;

    mount_comments(
        &server,
        10,
        ResponseTemplate::new(200).set_body_json(tree_for_post_10()),
    )
    .await;
    mount_comments(
        &server,
        20,
        ResponseTemplate::new(200).set_body_json(json!({ "comments": [] })),
    )
    .await;

    let report = coordinator.run(Pipeline::Comments).await.unwrap();

    assert_eq!(report.summary(), "4 comments stored");
    assert_eq!(report.counters.items_processed, 2);
    assert_eq!(report.counters.rows_written, 4);
    assert_eq!(report.counters.items_skipped, 0);
    drop(coordinator);

    let conn = open_db(&database);
    let mut stmt = conn
        .prepare("SELECT ID, PostID, Name, ChildrenCount FROM comments ORDER BY ID")
        .unwrap();
    let rows: Vec<(i64, i64, String, i64)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    let ids: Vec<i64> = rows.iter().map(|r| r.0).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert!(rows.iter().all(|r| r.1 == 10));
    assert_eq!(rows[0].2, "Reader 1");
    assert_eq!(rows[0].3, 1);

    // A parent's stored JSON carries its subtree
    let original: String = conn
        .query_row("SELECT OriginalJSON FROM comments WHERE ID = 1", [], |row| {
            row.get(0)
        })
        .unwrap();
    let original: Value = serde_json::from_str(&original).unwrap();
    assert_eq!(original["children"][0]["id"], 2);
    assert_eq!(original["children"][0]["children"][0]["id"], 3);
}

#[tokio::test]
async fn test_failed_article_is_skipped_and_recorded() {
    let server = MockServer::start().await;
    let (_dir, database) = temp_database();
    let mut coordinator = seed_articles(&server, &database).await;

    mount_comments(
        &server,
        10,
        ResponseTemplate::new(200).set_body_json(tree_for_post_10()),
    )
    .await;
    mount_comments(&server, 20, ResponseTemplate::new(500)).await;

    let report = coordinator.run(Pipeline::Comments).await.unwrap();

    assert_eq!(report.total_rows, 4);
    assert_eq!(report.counters.items_processed, 2);
    assert_eq!(report.counters.items_skipped, 1);

    let storage = coordinator.storage();
    assert_eq!(storage.get_run(report.run_id).unwrap().status, RunStatus::Completed);

    let events = storage.events_for_run(report.run_id).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].stage, EventStage::Fetch);
    assert_eq!(events[0].item, "20");
    assert_eq!(events[0].pipeline, "comments");
}

#[tokio::test]
async fn test_undecodable_tree_is_skipped() {
    let server = MockServer::start().await;
    let (_dir, database) = temp_database();
    let mut coordinator = seed_articles(&server, &database).await;

    mount_comments(
        &server,
        10,
        ResponseTemplate::new(200).set_body_string("<html>rate limited</html>"),
    )
    .await;
    mount_comments(
        &server,
        20,
        ResponseTemplate::new(200).set_body_json(json!({
            "comments": [comment_json(7, 20, vec![])]
        })),
    )
    .await;

    let report = coordinator.run(Pipeline::Comments).await.unwrap();

    assert_eq!(report.summary(), "1 comments stored");

    let events = coordinator.storage().events_for_run(report.run_id).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].stage, EventStage::Decode);
    assert_eq!(events[0].item, "10");
}

#[tokio::test]
async fn test_rerun_counts_duplicate_comments() {
    let server = MockServer::start().await;
    let (_dir, database) = temp_database();
    let mut coordinator = seed_articles(&server, &database).await;

    let template = ResponseTemplate::new(200).set_body_json(tree_for_post_10());
    Mock::given(method("GET"))
        .and(path("/api/v1/post/10/comments"))
        .respond_with(template)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/post/20/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "comments": [] })))
        .expect(2)
        .mount(&server)
        .await;

    coordinator.run(Pipeline::Comments).await.unwrap();
    let report = coordinator.run(Pipeline::Comments).await.unwrap();

    assert_eq!(report.total_rows, 4);
    assert_eq!(report.counters.rows_written, 0);
    assert_eq!(report.counters.rows_failed, 4);
    assert_eq!(coordinator.storage().count_rows(Table::Comments).unwrap(), 4);
}

#[tokio::test]
async fn test_comments_without_articles_table_fails() {
    let server = MockServer::start().await;
    let (_dir, database) = temp_database();

    let mut coordinator = coordinator(&server, &database);
    assert!(coordinator.run(Pipeline::Comments).await.is_err());

    let run = &coordinator.storage().recent_runs(1).unwrap()[0];
    assert_eq!(run.status, RunStatus::Failed);
}

#[tokio::test]
async fn test_stores_every_comment_of_a_deep_reply_chain() {
    let server = MockServer::start().await;
    let (_dir, database) = temp_database();
    let mut coordinator = seed_articles(&server, &database).await;

    let mut chain = comment_json(200, 10, vec![]);
    for id in (1..200).rev() {
        chain = comment_json(id, 10, vec![chain]);
    }
    mount_comments(
        &server,
        10,
        ResponseTemplate::new(200).set_body_json(json!({ "comments": [chain] })),
    )
    .await;
    mount_comments(
        &server,
        20,
        ResponseTemplate::new(200).set_body_json(json!({ "comments": [] })),
    )
    .await;

    let report = coordinator.run(Pipeline::Comments).await.unwrap();

    assert_eq!(report.summary(), "200 comments stored");
    assert_eq!(report.counters.items_skipped, 0);
    assert!(coordinator
        .storage()
        .events_for_run(report.run_id)
        .unwrap()
        .is_empty());
}
