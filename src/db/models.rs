use serde::{Deserialize, Serialize};

/// A persisted blog post.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub status: String,
    pub published_at: Option<String>,
    pub author_id: Option<i64>,
    pub cover_image: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub seo_score: Option<i64>,
    pub reading_time: i64,
    pub views: i64,
    pub likes_count: i64,
    pub comments_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Publication status of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
    Scheduled,
}

impl PostStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Scheduled => "scheduled",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "published" => Some(Self::Published),
            "scheduled" => Some(Self::Scheduled),
            _ => None,
        }
    }
}

impl Post {
    #[must_use]
    pub fn status_enum(&self) -> Option<PostStatus> {
        PostStatus::from_str(&self.status)
    }
}

/// A tag, upserted by slug.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub color: Option<String>,
    pub created_at: String,
}

/// A category, upserted by slug.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub color: Option<String>,
    pub created_at: String,
}

/// Data for inserting a new post.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub status: PostStatus,
    pub published_at: Option<String>,
    pub author_id: Option<i64>,
    pub cover_image: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub seo_score: Option<i64>,
    pub reading_time: i64,
}

/// Aggregate counts for the stats endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogStatistics {
    pub total_posts: i64,
    pub posts_today: i64,
    pub total_tags: i64,
    pub total_categories: i64,
}
