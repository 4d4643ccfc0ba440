//! Integration tests for the model-backed draft generator, using a mock
//! OpenAI-compatible API.

use std::time::Duration;

use blogsmith::config::Config;
use blogsmith::generator::{DraftGenerator, GenerationError, ModelDraftGenerator};
use blogsmith::topics::Topic;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DRAFT_JSON: &str = r#"{
    "title": "Shipping Rust Services Without the Drama",
    "excerpt": "What production Rust actually takes.",
    "content": "<h2>Start here</h2><p>Measure twice, deploy once.</p>",
    "tags": ["rust", "operations"],
    "seo_title": "Shipping Rust Services Without the Drama",
    "seo_description": "A grounded look at running Rust web services in production: deployment, observability, and the sharp edges nobody mentions in the tutorials.",
    "reading_time_minutes": 6
}"#;

fn topic() -> Topic {
    Topic {
        title: "Rust in production".to_string(),
        category: "Engineering".to_string(),
        keywords: vec!["rust".to_string(), "production".to_string()],
    }
}

fn config_for(server: &MockServer, with_images: bool) -> Config {
    let mut config = Config::for_testing();
    config.openai_base_url = format!("{}/v1", server.uri());
    if with_images {
        config.image_api_key = Some("img-key".to_string());
        config.image_base_url = format!("{}/v1", server.uri());
    }
    config
}

fn chat_response(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    }))
}

#[tokio::test]
async fn test_generates_draft_from_strict_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(chat_response(DRAFT_JSON))
        .mount(&server)
        .await;

    let generator = ModelDraftGenerator::new(&config_for(&server, false)).unwrap();
    let generated = generator.generate_draft(&topic()).await.unwrap();

    let draft = generated.draft;
    assert_eq!(draft.title, "Shipping Rust Services Without the Drama");
    assert_eq!(draft.slug, "shipping-rust-services-without-the-drama");
    assert_eq!(draft.tags, vec!["rust", "operations"]);
    assert_eq!(draft.category, "Engineering");
    assert_eq!(draft.reading_time_minutes, 6);
    assert!(draft.cover_image_url.is_none());
    assert!(generated.warnings.is_empty());
}

#[tokio::test]
async fn test_recovers_draft_from_fenced_output() {
    let server = MockServer::start().await;
    let fenced = format!("```json\n{DRAFT_JSON}\n```");
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(chat_response(&fenced))
        .mount(&server)
        .await;

    let generator = ModelDraftGenerator::new(&config_for(&server, false)).unwrap();
    let generated = generator.generate_draft(&topic()).await.unwrap();

    assert_eq!(generated.draft.slug, "shipping-rust-services-without-the-drama");
}

#[tokio::test]
async fn test_prose_only_output_is_generation_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(chat_response("I'm sorry, I can't write that post."))
        .mount(&server)
        .await;

    let generator = ModelDraftGenerator::new(&config_for(&server, false)).unwrap();
    let error = generator.generate_draft(&topic()).await.unwrap_err();

    assert!(matches!(error, GenerationError::Malformed(_)));
}

#[tokio::test]
async fn test_api_failure_is_generation_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let generator = ModelDraftGenerator::new(&config_for(&server, false)).unwrap();
    let error = generator.generate_draft(&topic()).await.unwrap_err();

    match error {
        GenerationError::Api { status, .. } => assert_eq!(status, 500),
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_api_times_out_as_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(chat_response(DRAFT_JSON).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let mut config = config_for(&server, false);
    config.generation_timeout = Duration::from_millis(200);

    let generator = ModelDraftGenerator::new(&config).unwrap();
    let error = generator.generate_draft(&topic()).await.unwrap_err();

    assert!(matches!(error, GenerationError::Http(_)));
}

#[tokio::test]
async fn test_cover_image_attached_when_image_api_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(chat_response(DRAFT_JSON))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "url": "https://cdn.example.com/cover.png" }]
        })))
        .mount(&server)
        .await;

    let generator = ModelDraftGenerator::new(&config_for(&server, true)).unwrap();
    let generated = generator.generate_draft(&topic()).await.unwrap();

    assert_eq!(
        generated.draft.cover_image_url.as_deref(),
        Some("https://cdn.example.com/cover.png")
    );
    assert!(generated.warnings.is_empty());
}

#[tokio::test]
async fn test_image_failure_is_a_warning_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(chat_response(DRAFT_JSON))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let generator = ModelDraftGenerator::new(&config_for(&server, true)).unwrap();
    let generated = generator.generate_draft(&topic()).await.unwrap();

    assert!(generated.draft.cover_image_url.is_none());
    assert_eq!(generated.warnings.len(), 1);
    assert!(generated.warnings[0].contains("cover image unavailable"));
}

#[tokio::test]
async fn test_health_probe_hits_models_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;

    let generator = ModelDraftGenerator::new(&config_for(&server, false)).unwrap();
    assert!(generator.health_probe().await);
}

#[tokio::test]
async fn test_health_probe_false_when_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let generator = ModelDraftGenerator::new(&config_for(&server, false)).unwrap();
    assert!(!generator.health_probe().await);
}
