//! Generation pipeline orchestrator.
//!
//! One batch invocation pulls topics, then for each topic drives
//! generate -> validate -> persist with bounded retries and a fixed delay
//! between attempts. Topics are processed sequentially: the generation APIs
//! are rate limited and slug resolution is simpler without intra-batch
//! writers. Per-topic failures land in the report, never across the
//! orchestrator boundary.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::db::{get_statistics, BlogStatistics, Database, Post};
use crate::generator::DraftGenerator;
use crate::persist::persist_draft;
use crate::seo;
use crate::slug::normalize_title;
use crate::topics::{Topic, TopicSource};

/// Largest batch a single invocation may request.
pub const MAX_BATCH_SIZE: usize = 5;

/// Caller-facing knobs for one batch. Omitted fields fall back to config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchRequest {
    pub count: usize,
    pub validate_seo: Option<bool>,
    pub min_seo_score: Option<u8>,
}

/// One line of the report's `posts` list.
#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    pub title: String,
    pub slug: String,
    pub url: String,
    pub published_at: Option<String>,
    pub seo_score: Option<i64>,
    pub reading_time: i64,
}

/// Counters for one batch invocation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchStats {
    pub requested: usize,
    pub generated: usize,
    pub failed: usize,
    /// Total generation attempts across all topics, retries included.
    pub attempts: u32,
}

/// The caller always receives a well-formed report; zero posts is
/// `success: false` plus populated `errors`, not an error return.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub success: bool,
    pub message: String,
    pub posts: Vec<PostSummary>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub stats: BatchStats,
}

/// The pipeline core: wires the topic source, generator, and store together.
pub struct Pipeline {
    topics: Arc<dyn TopicSource>,
    generator: Arc<dyn DraftGenerator>,
    db: Database,
    retry_attempts: u32,
    retry_delay: Duration,
    validate_seo: bool,
    min_seo_score: u8,
    strict_seo_validation: bool,
    site_url: String,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        config: &Config,
        topics: Arc<dyn TopicSource>,
        generator: Arc<dyn DraftGenerator>,
        db: Database,
    ) -> Self {
        Self {
            topics,
            generator,
            db,
            retry_attempts: config.retry_attempts.max(1),
            retry_delay: config.retry_delay,
            validate_seo: config.validate_seo,
            min_seo_score: config.min_seo_score,
            strict_seo_validation: config.strict_seo_validation,
            site_url: config.site_url.trim_end_matches('/').to_string(),
        }
    }

    /// The generator behind this pipeline, for health probing.
    #[must_use]
    pub fn generator(&self) -> &Arc<dyn DraftGenerator> {
        &self.generator
    }

    /// The database behind this pipeline.
    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.db
    }

    /// Read-only aggregate statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unavailable.
    pub async fn statistics(&self) -> anyhow::Result<BlogStatistics> {
        get_statistics(self.db.pool()).await
    }

    /// Run one batch and return its report.
    ///
    /// Topics are processed in source order and the `posts` list preserves
    /// that order. Partial success is a normal outcome.
    pub async fn run_batch(&self, request: &BatchRequest) -> BatchReport {
        let requested = request.count.clamp(1, MAX_BATCH_SIZE);
        let validate_seo = request.validate_seo.unwrap_or(self.validate_seo);
        let min_seo_score = request.min_seo_score.unwrap_or(self.min_seo_score);

        let mut report = BatchReport {
            success: false,
            message: String::new(),
            posts: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
            stats: BatchStats {
                requested,
                ..BatchStats::default()
            },
        };

        let topics = self.topics.fetch_candidate_topics(requested).await;
        let topics = dedup_topics(topics);

        if topics.is_empty() {
            report.message = "no candidate topics available".to_string();
            report
                .errors
                .push("topic sources returned no candidates".to_string());
            report.stats.failed = requested;
            return report;
        }

        if topics.len() < requested {
            report.warnings.push(format!(
                "only {} of {requested} requested topics available",
                topics.len()
            ));
        }

        info!(
            requested,
            topics = topics.len(),
            validate_seo,
            min_seo_score,
            "Starting generation batch"
        );

        for topic in &topics {
            match self
                .process_topic(topic, validate_seo, min_seo_score, &mut report)
                .await
            {
                Ok(post) => {
                    info!(slug = %post.slug, "Post published");
                    report.posts.push(self.summarize(&post));
                }
                Err(message) => {
                    warn!(topic = %topic.title, "Topic failed: {message}");
                    report.errors.push(format!("{}: {message}", topic.title));
                }
            }
        }

        report.stats.generated = report.posts.len();
        report.stats.failed = report.errors.len();
        report.success = !report.posts.is_empty();
        report.message = format!(
            "generated {} of {requested} requested posts",
            report.posts.len()
        );
        report
    }

    /// Drive one topic through generate -> validate -> persist.
    ///
    /// Generation errors and validation rejections share the same attempt
    /// budget; a full regeneration is performed on each retry. The error
    /// string returned here becomes the report's per-topic error entry.
    async fn process_topic(
        &self,
        topic: &Topic,
        validate_seo: bool,
        min_seo_score: u8,
        report: &mut BatchReport,
    ) -> Result<Post, String> {
        let attempts = self.retry_attempts;
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            report.stats.attempts += 1;

            let generated = match self.generator.generate_draft(topic).await {
                Ok(generated) => generated,
                Err(e) => {
                    debug!(topic = %topic.title, attempt, "Generation failed: {e}");
                    last_error = format!("generation failed after {attempts} attempts: {e}");
                    if attempt < attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                    continue;
                }
            };

            // Warnings travel with the draft; a discarded attempt takes its
            // warnings with it.
            let mut draft_warnings = generated.warnings;
            let draft = generated.draft;

            let validation = validate_seo.then(|| seo::score(&draft, min_seo_score));
            if let Some(validation) = &validation {
                if !validation.passed {
                    if attempt < attempts {
                        debug!(
                            topic = %topic.title,
                            score = validation.score,
                            "Draft below SEO threshold, regenerating"
                        );
                        tokio::time::sleep(self.retry_delay).await;
                        continue;
                    }
                    if self.strict_seo_validation {
                        return Err(format!(
                            "rejected by SEO validation after {attempts} attempts \
                             (score {}, needs {min_seo_score}): {}",
                            validation.score,
                            validation.reasons.join("; ")
                        ));
                    }
                    // Lenient policy: near-miss content beats an empty batch.
                    report.warnings.push(format!(
                        "'{}' accepted below SEO threshold (score {}, needs {min_seo_score}): {}",
                        draft.title,
                        validation.score,
                        validation.reasons.join("; ")
                    ));
                }
            }

            report.warnings.append(&mut draft_warnings);
            let seo_score = validation.as_ref().map(|v| v.score);
            return persist_draft(&self.db, &draft, seo_score)
                .await
                .map_err(|e| format!("failed to persist draft: {e:#}"));
        }

        Err(last_error)
    }

    fn summarize(&self, post: &Post) -> PostSummary {
        PostSummary {
            title: post.title.clone(),
            slug: post.slug.clone(),
            url: format!("{}/blog/{}", self.site_url, post.slug),
            published_at: post.published_at.clone(),
            seo_score: post.seo_score,
            reading_time: post.reading_time,
        }
    }
}

/// Drop topics whose normalized titles repeat, keeping first occurrence.
///
/// Duplicate topics inside one batch would otherwise race each other into
/// slug suffixes for identical content.
fn dedup_topics(topics: Vec<Topic>) -> Vec<Topic> {
    let mut seen = std::collections::HashSet::new();
    topics
        .into_iter()
        .filter(|topic| seen.insert(normalize_title(&topic.title)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(title: &str) -> Topic {
        Topic {
            title: title.to_string(),
            category: "Engineering".to_string(),
            keywords: Vec::new(),
        }
    }

    #[test]
    fn test_dedup_topics_by_normalized_title() {
        let topics = vec![
            topic("Rust Async"),
            topic("rust async!"),
            topic("Something Else"),
        ];
        let deduped = dedup_topics(topics);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].title, "Rust Async");
        assert_eq!(deduped[1].title, "Something Else");
    }

    #[test]
    fn test_dedup_preserves_order() {
        let topics = vec![topic("B topic"), topic("A topic"), topic("B Topic")];
        let deduped = dedup_topics(topics);
        assert_eq!(deduped[0].title, "B topic");
        assert_eq!(deduped[1].title, "A topic");
    }
}
