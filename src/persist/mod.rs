//! Persistence gateway.
//!
//! Turns an accepted draft into a post row with a guaranteed-unique slug and
//! idempotent taxonomy. All uniqueness decisions are delegated to database
//! constraints so that concurrent batch invocations cannot duplicate rows.

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::debug;

use crate::db::{
    get_post, insert_post, link_post_category, link_post_tag, slug_exists, upsert_category,
    upsert_tag, Database, NewPost, Post, PostStatus,
};
use crate::generator::Draft;
use crate::slug::slugify;

/// Probe limit for slug suffixing; beyond this something is systematically wrong.
const MAX_SLUG_PROBES: u32 = 50;

/// Persist an accepted draft as a published post.
///
/// Tags and the category are upserted by slug (create-if-absent,
/// reuse-if-present), the post slug is made unique with a numeric suffix,
/// and the insert retries on a unique violation in case a concurrent batch
/// claimed the probed slug between check and insert.
///
/// # Errors
///
/// Returns an error on database failure or slug-probe exhaustion.
pub async fn persist_draft(db: &Database, draft: &Draft, seo_score: Option<u8>) -> Result<Post> {
    let pool = db.pool();

    // Taxonomy first: tag/category ids exist before the post references them.
    let mut tag_ids = Vec::with_capacity(draft.tags.len());
    for tag in &draft.tags {
        let slug = slugify(tag);
        let id = upsert_tag(pool, tag, &slug).await?;
        tag_ids.push(id);
    }

    let category_id = if draft.category.trim().is_empty() {
        None
    } else {
        let slug = slugify(&draft.category);
        Some(upsert_category(pool, &draft.category, &slug).await?)
    };

    let post_id = insert_with_unique_slug(db, draft, seo_score).await?;

    for tag_id in tag_ids {
        link_post_tag(pool, post_id, tag_id).await?;
    }
    if let Some(category_id) = category_id {
        link_post_category(pool, post_id, category_id).await?;
    }

    let post = get_post(pool, post_id)
        .await?
        .context("Post vanished immediately after insert")?;

    debug!(slug = %post.slug, id = post.id, "Draft persisted");
    Ok(post)
}

/// Insert the post row, resolving slug collisions with a numeric suffix.
///
/// The existence pre-check keeps the common case to one probe; the unique
/// constraint on `posts.slug` catches the race where a concurrent writer
/// takes the candidate between check and insert, in which case the loop
/// simply moves on to the next suffix.
async fn insert_with_unique_slug(
    db: &Database,
    draft: &Draft,
    seo_score: Option<u8>,
) -> Result<i64> {
    let pool = db.pool();
    let base = &draft.slug;

    for probe in 0..MAX_SLUG_PROBES {
        let candidate = if probe == 0 {
            base.clone()
        } else {
            format!("{base}-{probe}")
        };

        if slug_exists(pool, &candidate).await? {
            continue;
        }

        let new_post = NewPost {
            title: draft.title.clone(),
            slug: candidate.clone(),
            content: draft.content.clone(),
            excerpt: draft.excerpt.clone(),
            status: PostStatus::Published,
            published_at: Some(Utc::now().to_rfc3339()),
            author_id: None,
            cover_image: draft.cover_image_url.clone(),
            seo_title: Some(draft.seo_title.clone()),
            seo_description: Some(draft.seo_description.clone()),
            seo_score: seo_score.map(i64::from),
            reading_time: i64::from(draft.reading_time_minutes),
        };

        match insert_post(pool, &new_post).await {
            Ok(id) => return Ok(id),
            Err(e) if is_unique_violation(&e) => {
                debug!(slug = %candidate, "Slug claimed concurrently, probing next suffix");
                continue;
            }
            Err(e) => return Err(e).context("Failed to insert post"),
        }
    }

    anyhow::bail!("Exhausted slug probes for base '{base}'")
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(|db_error| db_error.is_unique_violation())
}
