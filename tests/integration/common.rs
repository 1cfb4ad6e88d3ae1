use acx_harvest::config::Config;
use acx_harvest::crawler::Coordinator;
use rusqlite::Connection;
use serde_json::{json, Value};
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Configuration pointing at the mock server, without request delay
pub fn test_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.api.base_url = server.uri();
    config.crawler.request_delay = 0;
    config.user_agent.crawler_name = "TestBot".to_string();
    config.user_agent.crawler_version = "1.0.0".to_string();
    config
}

/// A database path inside a fresh temporary directory
///
/// The directory is removed when the returned guard is dropped.
pub fn temp_database() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("harvest.db");
    (dir, path)
}

pub fn coordinator(server: &MockServer, database: &PathBuf) -> Coordinator {
    Coordinator::new(&test_config(server), "test-hash", database)
        .expect("Failed to create coordinator")
}

pub fn open_db(database: &PathBuf) -> Connection {
    Connection::open(database).expect("Failed to open database")
}

/// An archive entry as the listing endpoint sends it
pub fn article_json(id: i64, slug: &str) -> Value {
    json!({
        "id": id,
        "publication_id": 89120,
        "title": format!("Post {}", id),
        "social_title": null,
        "slug": slug,
        "post_date": "2024-03-01T10:00:00.000Z",
        "audience": "everyone",
        "write_comment_permissions": "everyone",
        "canonical_url": format!("https://example.substack.com/p/{}", slug),
        "cover_image": null,
        "description": "A description",
        "wordcount": 1500,
        "comment_count": 4,
        "child_comment_count": 2,
        "podcast_url": null,
        "reactions": { "❤": 12 }
    })
}

pub fn articles(ids: std::ops::RangeInclusive<i64>) -> Vec<Value> {
    ids.map(|id| article_json(id, &format!("post-{}", id)))
        .collect()
}

/// Mounts one archive page, expected to be requested exactly once
pub async fn mount_listing(server: &MockServer, offset: u64, body: Value) {
    Mock::given(method("GET"))
        .and(path("/api/v1/archive"))
        .and(query_param("sort", "new"))
        .and(query_param("offset", offset.to_string()))
        .and(query_param("limit", "12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

/// Mounts a listing whose pages hold `items`, followed by an empty page
pub async fn mount_archive(server: &MockServer, items: Vec<Value>) {
    let mut offset = 0;
    for page in items.chunks(12) {
        mount_listing(server, offset, Value::Array(page.to_vec())).await;
        offset += 12;
    }
    mount_listing(server, offset, json!([])).await;
}

pub fn comment_json(id: i64, post_id: i64, children: Vec<Value>) -> Value {
    json!({
        "id": id,
        "post_id": post_id,
        "user_id": 1000 + id,
        "date": "2024-03-02T08:00:00.000Z",
        "body": format!("Comment {}", id),
        "name": format!("Reader {}", id),
        "deleted": false,
        "ancestor_path": "",
        "children_count": children.len(),
        "children": children
    })
}

pub async fn mount_comments(server: &MockServer, post_id: i64, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/post/{}/comments", post_id)))
        .and(query_param("all_comments", "true"))
        .and(query_param("sort", "oldest_first"))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}
