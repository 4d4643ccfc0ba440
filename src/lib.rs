//! Blogsmith library.
//!
//! A service that generates blog posts automatically: candidate topics are
//! pulled from external feeds, drafted by a text-generation model, scored
//! against a deterministic SEO rubric, and persisted with unique slugs and
//! idempotent tag/category taxonomy. Batches are triggered over HTTP or by
//! the in-process publish scheduler.

pub mod config;
pub mod db;
pub mod generator;
pub mod persist;
pub mod pipeline;
pub mod scheduler;
pub mod seo;
pub mod slug;
pub mod topics;
pub mod web;
