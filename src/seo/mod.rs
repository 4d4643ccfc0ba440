//! Deterministic SEO scoring.
//!
//! A pure rubric over a draft: no I/O, no randomness, never fails. Fields
//! that cannot be judged simply count against the score.

use serde::Serialize;

use crate::generator::Draft;

/// Bounds for a search-friendly title, in characters.
const TITLE_LEN: (usize, usize) = (30, 60);
/// Bounds for a meta description, in characters.
const DESCRIPTION_LEN: (usize, usize) = (120, 160);

/// Outcome of scoring one draft against the rubric.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    /// 0-100, floor of satisfied/total criteria.
    pub score: u8,
    pub passed: bool,
    /// One entry per failed criterion, human readable.
    pub reasons: Vec<String>,
}

/// Score a draft against the rubric.
///
/// `threshold` is the minimum passing score; the policy default lives in
/// configuration, callers may override it per batch.
#[must_use]
pub fn score(draft: &Draft, threshold: u8) -> ValidationResult {
    let mut reasons = Vec::new();

    let title_len = draft.title.chars().count();
    let checks = [
        (
            title_len >= TITLE_LEN.0 && title_len <= TITLE_LEN.1,
            format!(
                "title length {} outside {}-{} characters",
                title_len, TITLE_LEN.0, TITLE_LEN.1
            ),
        ),
        {
            let len = draft.seo_description.chars().count();
            (
                len >= DESCRIPTION_LEN.0 && len <= DESCRIPTION_LEN.1,
                format!(
                    "seo description length {} outside {}-{} characters",
                    len, DESCRIPTION_LEN.0, DESCRIPTION_LEN.1
                ),
            )
        },
        (
            draft.cover_image_url.is_some(),
            "no cover image".to_string(),
        ),
        (
            !draft.tags.is_empty(),
            "no tags".to_string(),
        ),
        (
            !draft.category.trim().is_empty(),
            "no category".to_string(),
        ),
        (
            draft.reading_time_minutes >= 1,
            "no reading time".to_string(),
        ),
    ];

    let total = checks.len();
    let mut satisfied = 0usize;
    for (ok, reason) in checks {
        if ok {
            satisfied += 1;
        } else {
            reasons.push(reason);
        }
    }

    let score = u8::try_from(satisfied * 100 / total).unwrap_or(100);

    ValidationResult {
        score,
        passed: score >= threshold,
        reasons,
    }
}
