//! Draft generation.
//!
//! Turns a [`Topic`] into a structured [`Draft`] by driving a chat-completion
//! model with a fixed prompt contract, then optionally fetching a cover image.
//! The model must answer with a single JSON object; anything else goes through
//! best-effort extraction before being rejected.

mod chat;
mod extract;
mod image;

pub use chat::ChatClient;
pub use extract::extract_json_object;
pub use image::ImageClient;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::slug::slugify;
use crate::topics::Topic;

/// Words-per-minute used to estimate reading time when the model omits it.
const READING_WPM: usize = 200;

/// An in-memory, not-yet-persisted candidate blog post.
#[derive(Debug, Clone)]
pub struct Draft {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub tags: Vec<String>,
    pub category: String,
    pub seo_title: String,
    pub seo_description: String,
    pub cover_image_url: Option<String>,
    pub reading_time_minutes: u32,
}

/// A generated draft plus any non-fatal warnings gathered along the way.
#[derive(Debug, Clone)]
pub struct GeneratedDraft {
    pub draft: Draft,
    pub warnings: Vec<String>,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("generation API returned status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("model returned an empty response")]
    EmptyResponse,
    #[error("model output could not be parsed as a draft: {0}")]
    Malformed(String),
}

/// Produces a draft for a topic.
///
/// A trait seam so the orchestrator can be driven by mocks in tests.
#[async_trait]
pub trait DraftGenerator: Send + Sync {
    async fn generate_draft(&self, topic: &Topic) -> Result<GeneratedDraft, GenerationError>;

    /// Reachability probe for the health endpoint. Mock implementations are
    /// always healthy.
    async fn health_probe(&self) -> bool {
        true
    }
}

/// The strict output contract sent as the system prompt. The model must
/// answer with exactly one JSON object using these keys.
const SYSTEM_PROMPT: &str = r#"You are a senior content writer for a technology consulting company.
Write an original, well-structured blog post for the given topic.

Respond with a single JSON object and nothing else. No prose, no code fences.
The object must have exactly these keys:
{
  "title": "post title, 30-60 characters, compelling and specific",
  "excerpt": "1-2 sentence summary for listing pages",
  "content": "full post body as HTML using <h2>, <h3>, <p>, <ul>, <li>",
  "tags": ["3-5 lowercase topical tags"],
  "seo_title": "search-optimized title, 30-60 characters",
  "seo_description": "meta description, 120-160 characters",
  "reading_time_minutes": 5
}"#;

/// Shape the model's JSON answer must deserialize into.
#[derive(Debug, Deserialize)]
struct DraftPayload {
    title: String,
    excerpt: String,
    content: String,
    #[serde(default)]
    tags: Vec<String>,
    seo_title: Option<String>,
    seo_description: Option<String>,
    reading_time_minutes: Option<u32>,
}

/// Generator backed by real chat-completion and image APIs.
pub struct ModelDraftGenerator {
    chat: ChatClient,
    image: Option<ImageClient>,
}

impl ModelDraftGenerator {
    /// Build the generator from configuration. The image client is only
    /// constructed when an image API key is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be constructed.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let chat = ChatClient::new(
            config.openai_api_key.clone(),
            config.openai_model.clone(),
            config.openai_base_url.clone(),
            config.generation_timeout,
        )?;

        let image = config
            .image_api_key
            .as_ref()
            .map(|key| {
                ImageClient::new(
                    key.clone(),
                    config.image_model.clone(),
                    config.image_base_url.clone(),
                    config.generation_timeout,
                )
            })
            .transpose()?;

        Ok(Self { chat, image })
    }

    fn user_prompt(topic: &Topic) -> String {
        format!(
            "Topic: {}\nCategory: {}\nTarget keywords: {}",
            topic.title,
            topic.category,
            topic.keywords.join(", ")
        )
    }
}

#[async_trait]
impl DraftGenerator for ModelDraftGenerator {
    async fn generate_draft(&self, topic: &Topic) -> Result<GeneratedDraft, GenerationError> {
        let raw = self
            .chat
            .complete(SYSTEM_PROMPT, &Self::user_prompt(topic))
            .await?;

        let mut draft = parse_draft(&raw, topic)?;
        let mut warnings = Vec::new();

        if let Some(image) = &self.image {
            match image.generate_cover(&draft.title).await {
                Ok(url) => draft.cover_image_url = Some(url),
                Err(e) => {
                    // A missing cover image costs SEO score but never the draft.
                    warn!(title = %draft.title, "Cover image generation failed: {e}");
                    warnings.push(format!(
                        "cover image unavailable for '{}': {e}",
                        draft.title
                    ));
                }
            }
        }

        debug!(title = %draft.title, slug = %draft.slug, "Draft generated");
        Ok(GeneratedDraft { draft, warnings })
    }

    async fn health_probe(&self) -> bool {
        self.chat.probe().await
    }
}

/// Parse raw model output into a draft: strict JSON first, then best-effort
/// extraction of the outermost object.
fn parse_draft(raw: &str, topic: &Topic) -> Result<Draft, GenerationError> {
    let payload: DraftPayload = match serde_json::from_str(raw) {
        Ok(payload) => payload,
        Err(_) => {
            let extracted = extract_json_object(raw)?;
            serde_json::from_str(&extracted)
                .map_err(|e| GenerationError::Malformed(e.to_string()))?
        }
    };

    if payload.title.trim().is_empty() {
        return Err(GenerationError::Malformed("draft title is empty".to_string()));
    }
    if payload.content.trim().is_empty() {
        return Err(GenerationError::Malformed("draft content is empty".to_string()));
    }

    let reading_time_minutes = payload
        .reading_time_minutes
        .filter(|&m| m > 0)
        .unwrap_or_else(|| estimate_reading_time(&payload.content));

    Ok(Draft {
        slug: slugify(&payload.title),
        seo_title: payload.seo_title.unwrap_or_else(|| payload.title.clone()),
        seo_description: payload.seo_description.unwrap_or_else(|| payload.excerpt.clone()),
        title: payload.title,
        excerpt: payload.excerpt,
        content: payload.content,
        tags: payload.tags,
        category: topic.category.clone(),
        cover_image_url: None,
        reading_time_minutes,
    })
}

/// Estimate reading time from word count, minimum one minute.
fn estimate_reading_time(content: &str) -> u32 {
    let words = content.split_whitespace().count();
    u32::try_from(words.div_ceil(READING_WPM)).unwrap_or(1).max(1)
}
