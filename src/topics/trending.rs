use chrono::{Duration, Utc};
use serde::Deserialize;

use super::{SourceError, Topic};

/// Trending-repository feed (GitHub search API shape).
pub struct TrendingReposFeed {
    url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Repo>,
}

#[derive(Debug, Deserialize)]
struct Repo {
    name: String,
    description: Option<String>,
    language: Option<String>,
    #[serde(default)]
    topics: Vec<String>,
}

impl TrendingReposFeed {
    #[must_use]
    pub fn new(url: String) -> Self {
        Self { url }
    }

    /// Fetch up to `count` recently created, highly starred repositories and
    /// turn them into article topics.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    pub async fn fetch(
        &self,
        client: &reqwest::Client,
        count: usize,
    ) -> Result<Vec<Topic>, SourceError> {
        let since = (Utc::now() - Duration::days(7)).format("%Y-%m-%d");
        let response = client
            .get(&self.url)
            .query(&[
                ("q", format!("created:>{since}")),
                ("sort", "stars".to_string()),
                ("order", "desc".to_string()),
                ("per_page", count.to_string()),
            ])
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
            });
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Malformed(e.to_string()))?;

        let topics = body
            .items
            .into_iter()
            .filter_map(|repo| {
                let description = repo.description.filter(|d| !d.is_empty())?;
                let mut keywords = repo.topics;
                if let Some(lang) = &repo.language {
                    keywords.push(lang.to_lowercase());
                }
                keywords.truncate(5);
                Some(Topic {
                    title: format!("Inside {}: {}", repo.name, description),
                    category: repo.language.unwrap_or_else(|| "Open Source".to_string()),
                    keywords,
                })
            })
            .take(count)
            .collect();

        Ok(topics)
    }
}
