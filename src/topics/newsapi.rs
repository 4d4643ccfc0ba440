use serde::Deserialize;

use super::{keywords_from_title, SourceError, Topic};

/// News-headline feed (NewsAPI-compatible `top-headlines` endpoint).
pub struct NewsApiFeed {
    url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct HeadlinesResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    title: Option<String>,
    description: Option<String>,
}

impl NewsApiFeed {
    #[must_use]
    pub fn new(url: String, api_key: String) -> Self {
        Self { url, api_key }
    }

    /// Fetch up to `count` technology headlines as topics.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    pub async fn fetch(
        &self,
        client: &reqwest::Client,
        count: usize,
    ) -> Result<Vec<Topic>, SourceError> {
        let response = client
            .get(&self.url)
            .query(&[
                ("category", "technology"),
                ("pageSize", &count.to_string()),
            ])
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
            });
        }

        let body: HeadlinesResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Malformed(e.to_string()))?;

        let topics = body
            .articles
            .into_iter()
            .filter_map(|article| {
                let title = article.title?;
                if title.is_empty() {
                    return None;
                }
                // Keywords favor the description when present; headlines alone
                // are often too terse.
                let keyword_text = article.description.unwrap_or_else(|| title.clone());
                Some(Topic {
                    keywords: keywords_from_title(&keyword_text, 5),
                    title,
                    category: "Industry News".to_string(),
                })
            })
            .take(count)
            .collect();

        Ok(topics)
    }
}
