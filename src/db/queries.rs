use anyhow::{Context, Result};
use sqlx::SqlitePool;

use super::models::{BlogStatistics, Category, NewPost, Post, Tag};

// ========== Posts ==========

/// Get a post by id.
pub async fn get_post(pool: &SqlitePool, id: i64) -> Result<Option<Post>> {
    sqlx::query_as("SELECT * FROM posts WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch post by id")
}

/// Get a post by its slug.
pub async fn get_post_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Post>> {
    sqlx::query_as("SELECT * FROM posts WHERE slug = ?")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch post by slug")
}

/// Check whether a slug is already taken.
pub async fn slug_exists(pool: &SqlitePool, slug: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE slug = ?")
        .bind(slug)
        .fetch_one(pool)
        .await
        .context("Failed to check slug existence")?;
    Ok(count > 0)
}

/// Insert a new post, returning its ID.
///
/// The unique constraint on `slug` is the authority on collisions; callers
/// racing on the same slug receive the database error and re-resolve.
pub async fn insert_post(pool: &SqlitePool, post: &NewPost) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r"
        INSERT INTO posts (
            title, slug, content, excerpt, status, published_at, author_id,
            cover_image, seo_title, seo_description, seo_score, reading_time
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ",
    )
    .bind(&post.title)
    .bind(&post.slug)
    .bind(&post.content)
    .bind(&post.excerpt)
    .bind(post.status.as_str())
    .bind(&post.published_at)
    .bind(post.author_id)
    .bind(&post.cover_image)
    .bind(&post.seo_title)
    .bind(&post.seo_description)
    .bind(post.seo_score)
    .bind(post.reading_time)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Get the most recently created posts.
pub async fn get_recent_posts(pool: &SqlitePool, limit: i64) -> Result<Vec<Post>> {
    sqlx::query_as("SELECT * FROM posts ORDER BY created_at DESC, id DESC LIMIT ?")
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to fetch recent posts")
}

// ========== Taxonomy ==========

/// Upsert a tag by slug, returning its ID.
///
/// `INSERT .. ON CONFLICT DO NOTHING` followed by a re-select keeps this
/// idempotent under concurrent callers: exactly one row per slug exists
/// afterwards regardless of interleaving.
pub async fn upsert_tag(pool: &SqlitePool, name: &str, slug: &str) -> Result<i64> {
    sqlx::query("INSERT INTO tags (name, slug) VALUES (?, ?) ON CONFLICT(slug) DO NOTHING")
        .bind(name)
        .bind(slug)
        .execute(pool)
        .await
        .context("Failed to upsert tag")?;

    let id: i64 = sqlx::query_scalar("SELECT id FROM tags WHERE slug = ?")
        .bind(slug)
        .fetch_one(pool)
        .await
        .context("Failed to fetch tag after upsert")?;
    Ok(id)
}

/// Upsert a category by slug, returning its ID.
pub async fn upsert_category(pool: &SqlitePool, name: &str, slug: &str) -> Result<i64> {
    sqlx::query("INSERT INTO categories (name, slug) VALUES (?, ?) ON CONFLICT(slug) DO NOTHING")
        .bind(name)
        .bind(slug)
        .execute(pool)
        .await
        .context("Failed to upsert category")?;

    let id: i64 = sqlx::query_scalar("SELECT id FROM categories WHERE slug = ?")
        .bind(slug)
        .fetch_one(pool)
        .await
        .context("Failed to fetch category after upsert")?;
    Ok(id)
}

/// Get a tag by slug.
pub async fn get_tag_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Tag>> {
    sqlx::query_as("SELECT * FROM tags WHERE slug = ?")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch tag by slug")
}

/// Get a category by slug.
pub async fn get_category_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Category>> {
    sqlx::query_as("SELECT * FROM categories WHERE slug = ?")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch category by slug")
}

/// Attach a tag to a post. Idempotent.
pub async fn link_post_tag(pool: &SqlitePool, post_id: i64, tag_id: i64) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?, ?)")
        .bind(post_id)
        .bind(tag_id)
        .execute(pool)
        .await
        .context("Failed to link post to tag")?;
    Ok(())
}

/// Attach a category to a post. Idempotent.
pub async fn link_post_category(pool: &SqlitePool, post_id: i64, category_id: i64) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO post_categories (post_id, category_id) VALUES (?, ?)")
        .bind(post_id)
        .bind(category_id)
        .execute(pool)
        .await
        .context("Failed to link post to category")?;
    Ok(())
}

/// Get the tag slugs attached to a post.
pub async fn get_post_tag_slugs(pool: &SqlitePool, post_id: i64) -> Result<Vec<String>> {
    sqlx::query_scalar(
        r"
        SELECT t.slug FROM tags t
        JOIN post_tags pt ON pt.tag_id = t.id
        WHERE pt.post_id = ?
        ORDER BY t.slug
        ",
    )
    .bind(post_id)
    .fetch_all(pool)
    .await
    .context("Failed to fetch tags for post")
}

// ========== Statistics ==========

/// Count all posts.
pub async fn count_posts(pool: &SqlitePool) -> Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM posts")
        .fetch_one(pool)
        .await
        .context("Failed to count posts")
}

/// Count posts created today (UTC).
pub async fn count_posts_today(pool: &SqlitePool) -> Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE date(created_at) = date('now')")
        .fetch_one(pool)
        .await
        .context("Failed to count today's posts")
}

/// Count all tags.
pub async fn count_tags(pool: &SqlitePool) -> Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM tags")
        .fetch_one(pool)
        .await
        .context("Failed to count tags")
}

/// Count all categories.
pub async fn count_categories(pool: &SqlitePool) -> Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM categories")
        .fetch_one(pool)
        .await
        .context("Failed to count categories")
}

/// Read-only aggregate statistics for the stats endpoint.
pub async fn get_statistics(pool: &SqlitePool) -> Result<BlogStatistics> {
    Ok(BlogStatistics {
        total_posts: count_posts(pool).await?,
        posts_today: count_posts_today(pool).await?,
        total_tags: count_tags(pool).await?,
        total_categories: count_categories(pool).await?,
    })
}
