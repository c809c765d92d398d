use crate::{router, AppState};
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use storage::{BlobStore, DigestStore, MemoryBlobStore, JSON_CONTENT_TYPE};
use tower::ServiceExt;

const DIGEST: &str = "# Reddit Digest • 02-05-2024\n\n## Other subreddits\n### r/OpenAI\n1. **Release** (👍 40 | 💬 3) [🔗 Link](https://reddit.com/r/OpenAI/comments/a/)\n\n---\n\n#### General trends\n* **Agents** - everywhere.";

fn subreddits() -> Vec<String> {
    vec!["OpenAI".to_string(), "ClaudeAI".to_string(), "grok".to_string()]
}

async fn seeded_app() -> Router {
    let store = DigestStore::new(MemoryBlobStore::new());
    for date in ["2024-05-01", "2024-05-02", "2024-05-03"] {
        store.save_digest(date, DIGEST).await.unwrap();
    }

    let documents = [
        (
            "data/posts_2024-05-02.json",
            json!({
                "date": "2024-05-02",
                "total_posts_collected": 1200,
                "total_posts_filtered": 3,
                "posts": [
                    {"subreddit": "OpenAI"},
                    {"subreddit": "OpenAI"},
                    {"subreddit": "grok"}
                ]
            }),
        ),
        (
            "data/posts_2024-05-01.json",
            json!({"date": "2024-05-01", "total_posts": 34, "posts": []}),
        ),
        ("data/posts_2024-05-03.json", json!({"posts": [{}, {}]})),
    ];
    for (key, document) in documents {
        store
            .blobs()
            .put(key, serde_json::to_vec(&document).unwrap(), JSON_CONTENT_TYPE)
            .await
            .unwrap();
    }

    router(AppState::new(store, subreddits()))
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    let response = app.oneshot(request).await.expect("router should respond");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_index_shows_recent_digests_and_totals() {
    let (status, html) = get(seeded_app().await, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(r#"href="/digest/2024-05-03""#));
    assert!(html.contains(r#"href="/digest/2024-05-01""#));
    assert!(html.contains("<strong>3</strong> digests"));
    assert!(html.contains("<strong>3</strong> subreddits"));
    // 1200 + 34 + 2
    assert!(html.contains("<strong>1 236</strong> posts analyzed"));
}

#[tokio::test]
async fn test_digest_page_renders_markdown_with_navigation() {
    let (status, html) = get(seeded_app().await, "/digest/2024-05-02").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<h4>General trends</h4>"));
    assert!(html.contains(r#"target="_blank""#));
    assert!(html.contains(r#"href="/digest/2024-05-01""#));
    assert!(html.contains(r#"href="/digest/2024-05-03""#));
    assert!(html.contains("Collected <strong>1 200</strong>"));
    assert!(html.contains("<li>r/OpenAI <span>2</span></li>"));
    assert!(html.contains("<li>r/grok <span>1</span></li>"));
    assert!(!html.contains("r/ClaudeAI <span>"));
}

#[tokio::test]
async fn test_digest_page_status_codes() {
    let (status, _) = get(seeded_app().await, "/digest/2024-06-01").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(seeded_app().await, "/digest/yesterday").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_archive_and_about() {
    let (status, html) = get(seeded_app().await, "/archive").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("3 digests from 1 May 2024 to 3 May 2024"));

    let (status, html) = get(seeded_app().await, "/about").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("<li>r/ClaudeAI</li>"));
}

#[tokio::test]
async fn test_api_lists_digests_newest_first() {
    let (status, body) = get(seeded_app().await, "/api/digests").await;
    assert_eq!(status, StatusCode::OK);

    let value: Value = serde_json::from_str(&body).unwrap();
    let digests = value["digests"].as_array().unwrap();
    assert_eq!(digests.len(), 3);
    assert_eq!(digests[0]["date"], "2024-05-03");
    assert_eq!(digests[0]["title"], "Reddit Digest • 03-05-2024");
    assert_eq!(digests[0]["formatted_date"], "3 May 2024");
    assert_eq!(digests[0]["file_name"], "digest_2024-05-03.md");
}

#[tokio::test]
async fn test_api_digest_returns_markdown_and_html() {
    let (status, body) = get(seeded_app().await, "/api/digest/2024-05-02").await;
    assert_eq!(status, StatusCode::OK);

    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["date"], "2024-05-02");
    assert_eq!(value["content"], DIGEST);
    assert!(value["html"].as_str().unwrap().contains("<h1>Reddit Digest • 02-05-2024</h1>"));

    let (status, _) = get(seeded_app().await, "/api/digest/2030-01-01").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_store() {
    let app = router(AppState::new(
        DigestStore::new(MemoryBlobStore::new()),
        subreddits(),
    ));

    let (status, html) = get(app.clone(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("No digests have been published yet."));

    let (_, body) = get(app, "/api/digests").await;
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"digests": []}));
}
