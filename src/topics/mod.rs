//! Candidate topic sourcing.
//!
//! Topics seed the generation pipeline. Two upstream feeds are queried (news
//! headlines and trending repositories); either failing is logged and
//! skipped, never surfaced to the pipeline. When both feeds come back empty
//! a curated fallback list keeps the pipeline usable.

mod newsapi;
mod trending;

pub use newsapi::NewsApiFeed;
pub use trending::TrendingReposFeed;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

/// A seed idea for one generated post.
#[derive(Debug, Clone)]
pub struct Topic {
    pub title: String,
    pub category: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("topic feed request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("topic feed returned status {status}")]
    Status { status: u16 },
    #[error("topic feed response was malformed: {0}")]
    Malformed(String),
}

/// Produces candidate topics for a batch.
///
/// Implementations never fail: a degraded or empty result is a valid
/// response, and retries belong to the orchestrator, not here.
#[async_trait]
pub trait TopicSource: Send + Sync {
    async fn fetch_candidate_topics(&self, count: usize) -> Vec<Topic>;
}

/// Topic source backed by the configured upstream feeds.
pub struct FeedTopicSource {
    client: reqwest::Client,
    news: Option<NewsApiFeed>,
    trending: TrendingReposFeed,
}

impl FeedTopicSource {
    /// Build a feed-backed topic source from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(concat!("blogsmith/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let news = config
            .news_api_key
            .as_ref()
            .map(|key| NewsApiFeed::new(config.news_api_url.clone(), key.clone()));

        Ok(Self {
            client,
            news,
            trending: TrendingReposFeed::new(config.trending_api_url.clone()),
        })
    }
}

#[async_trait]
impl TopicSource for FeedTopicSource {
    async fn fetch_candidate_topics(&self, count: usize) -> Vec<Topic> {
        let mut topics = Vec::new();

        if let Some(news) = &self.news {
            match news.fetch(&self.client, count).await {
                Ok(mut found) => {
                    debug!(count = found.len(), "News feed returned topics");
                    topics.append(&mut found);
                }
                Err(e) => warn!("News feed unavailable, skipping: {e}"),
            }
        }

        if topics.len() < count {
            match self.trending.fetch(&self.client, count - topics.len()).await {
                Ok(mut found) => {
                    debug!(count = found.len(), "Trending feed returned topics");
                    topics.append(&mut found);
                }
                Err(e) => warn!("Trending feed unavailable, skipping: {e}"),
            }
        }

        if topics.is_empty() {
            warn!("All topic feeds empty, falling back to curated topics");
            topics = fallback_topics(count);
        }

        topics.truncate(count);
        topics
    }
}

/// Curated evergreen topics used when no upstream feed yields anything.
fn fallback_topics(count: usize) -> Vec<Topic> {
    const SEEDS: &[(&str, &str, &[&str])] = &[
        (
            "How Small Teams Ship Reliable Software Faster",
            "Engineering",
            &["delivery", "ci-cd", "team-process"],
        ),
        (
            "Choosing Between Monoliths and Microservices in 2026",
            "Architecture",
            &["microservices", "monolith", "architecture"],
        ),
        (
            "A Practical Guide to Observability on a Budget",
            "Operations",
            &["observability", "logging", "metrics"],
        ),
        (
            "What Legacy Modernization Actually Costs",
            "Consulting",
            &["legacy", "modernization", "migration"],
        ),
        (
            "Security Basics Most Startups Still Get Wrong",
            "Security",
            &["security", "startups", "best-practices"],
        ),
    ];

    SEEDS
        .iter()
        .take(count)
        .map(|(title, category, keywords)| Topic {
            title: (*title).to_string(),
            category: (*category).to_string(),
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        })
        .collect()
}

/// Derive keywords from a headline: longest words first, stop words dropped.
pub(crate) fn keywords_from_title(title: &str, max: usize) -> Vec<String> {
    const STOP_WORDS: &[&str] = &[
        "the", "and", "for", "with", "that", "this", "from", "what", "why", "how", "are", "was",
        "has", "have", "its", "their", "into", "over", "after", "about",
    ];

    let mut words: Vec<String> = title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 3)
        .map(str::to_lowercase)
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
        .collect();
    words.sort_unstable();
    words.dedup();
    words.sort_by_key(|w| std::cmp::Reverse(w.len()));
    words.truncate(max);
    words
}
