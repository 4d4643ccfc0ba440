//! Integration tests for the HTTP trigger surface.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use blogsmith::config::Config;
use blogsmith::db::Database;
use blogsmith::generator::{Draft, DraftGenerator, GeneratedDraft, GenerationError};
use blogsmith::pipeline::Pipeline;
use blogsmith::topics::{Topic, TopicSource};
use blogsmith::web::{create_app, AppState};
use tempfile::TempDir;
use tower::ServiceExt;

struct StaticTopics(Vec<Topic>);

#[async_trait]
impl TopicSource for StaticTopics {
    async fn fetch_candidate_topics(&self, count: usize) -> Vec<Topic> {
        self.0.iter().take(count).cloned().collect()
    }
}

struct HappyGenerator;

#[async_trait]
impl DraftGenerator for HappyGenerator {
    async fn generate_draft(&self, topic: &Topic) -> Result<GeneratedDraft, GenerationError> {
        let title = format!("{} Field Notes for Busy Teams", topic.title);
        Ok(GeneratedDraft {
            draft: Draft {
                slug: blogsmith::slug::slugify(&title),
                seo_title: title.clone(),
                title,
                excerpt: "A short summary.".to_string(),
                content: "<p>Body.</p>".to_string(),
                tags: vec!["testing".to_string()],
                category: topic.category.clone(),
                seo_description: "A practical walkthrough of the topic for engineering leaders, \
                                  with concrete examples, trade-offs, and advice you can use."
                    .to_string(),
                cover_image_url: Some("https://img.example.com/c.png".to_string()),
                reading_time_minutes: 4,
            },
            warnings: Vec::new(),
        })
    }
}

async fn setup_app() -> (axum::Router, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db = Database::new(&temp_dir.path().join("test.sqlite"))
        .await
        .expect("Failed to create database");

    let config = Config::for_testing();
    let topics = vec![
        Topic {
            title: "Topic One".to_string(),
            category: "Engineering".to_string(),
            keywords: Vec::new(),
        },
        Topic {
            title: "Topic Two".to_string(),
            category: "Engineering".to_string(),
            keywords: Vec::new(),
        },
    ];

    let pipeline = Arc::new(Pipeline::new(
        &config,
        Arc::new(StaticTopics(topics)),
        Arc::new(HappyGenerator),
        db,
    ));

    let state = AppState {
        config: Arc::new(config),
        pipeline,
    };
    (create_app(state), temp_dir)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body was not JSON")
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_generate_returns_report() {
    let (app, _tmp) = setup_app().await;

    let response = app
        .oneshot(post_json("/api/generate", r#"{"count": 1}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["posts"].as_array().unwrap().len(), 1);
    assert_eq!(body["stats"]["requested"], 1);
    assert!(body["posts"][0]["url"]
        .as_str()
        .unwrap()
        .starts_with("https://blog.example.com/blog/"));
}

#[tokio::test]
async fn test_generate_rejects_count_out_of_range() {
    let (app, _tmp) = setup_app().await;

    let response = app
        .clone()
        .oneshot(post_json("/api/generate", r#"{"count": 0}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(post_json("/api/generate", r#"{"count": 6}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("count"));
}

#[tokio::test]
async fn test_generate_rejects_malformed_body() {
    let (app, _tmp) = setup_app().await;

    let response = app
        .oneshot(post_json("/api/generate", "{not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("invalid request body"));
}

#[tokio::test]
async fn test_generate_usage_document() {
    let (app, _tmp) = setup_app().await;

    let response = app
        .oneshot(Request::builder().uri("/api/generate").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["method"], "POST");
    assert_eq!(body["defaults"]["min_seo_score"], 70);
}

#[tokio::test]
async fn test_cron_requires_bearer_token() {
    let (app, _tmp) = setup_app().await;

    let response = app
        .clone()
        .oneshot(post_json("/api/cron/generate", ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let mut request = post_json("/api/cron/generate", "");
    request.headers_mut().insert(
        header::AUTHORIZATION,
        "Bearer wrong-secret".parse().unwrap(),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cron_runs_batch_with_valid_token() {
    let (app, _tmp) = setup_app().await;

    let mut request = post_json("/api/cron/generate", "");
    request.headers_mut().insert(
        header::AUTHORIZATION,
        "Bearer test-secret".parse().unwrap(),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    // posts_per_day = 2 in the test config
    assert_eq!(body["stats"]["requested"], 2);
}

#[tokio::test]
async fn test_healthz_reports_checks() {
    let (app, _tmp) = setup_app().await;

    let response = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["healthy"], true);
    assert_eq!(body["checks"]["database"], true);
    assert_eq!(body["checks"]["generator"], true);
}

#[tokio::test]
async fn test_stats_counts_generated_posts() {
    let (app, _tmp) = setup_app().await;

    let response = app
        .clone()
        .oneshot(post_json("/api/generate", r#"{"count": 2}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/api/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total_posts"], 2);
    assert_eq!(body["posts_today"], 2);
    assert_eq!(body["total_tags"], 1);
    assert_eq!(body["total_categories"], 1);
}
