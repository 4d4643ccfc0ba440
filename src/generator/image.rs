use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::GenerationError;

/// Client for an OpenAI-compatible image generation API.
///
/// Cover images are a nice-to-have: callers treat any error here as a
/// warning, never a draft failure.
#[derive(Debug, Clone)]
pub struct ImageClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct ImageRequest {
    model: String,
    prompt: String,
    n: u32,
    size: &'static str,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    url: Option<String>,
}

impl ImageClient {
    /// Create an image client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        api_key: String,
        model: String,
        base_url: String,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("blogsmith/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Generate a wide-format cover image for a post title, returning its URL.
    ///
    /// # Errors
    ///
    /// Returns a `GenerationError` when the request fails or the response
    /// carries no image URL.
    pub async fn generate_cover(&self, title: &str) -> Result<String, GenerationError> {
        let request = ImageRequest {
            model: self.model.clone(),
            prompt: format!(
                "Minimal, modern editorial illustration for a technology blog post titled \
                 \"{title}\". Flat design, muted blue and teal palette, no text, no logos."
            ),
            n: 1,
            size: "1792x1024",
        };

        debug!(model = %self.model, "Requesting cover image");

        let response = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ImageResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Malformed(format!("invalid image body: {e}")))?;

        body.data
            .into_iter()
            .next()
            .and_then(|d| d.url)
            .ok_or(GenerationError::EmptyResponse)
    }
}
