use once_cell::sync::Lazy;
use regex::Regex;

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

/// Maximum length of a generated slug, applied before uniqueness suffixing.
const MAX_SLUG_LEN: usize = 80;

/// Derive a URL-safe slug from a title.
///
/// Lowercases, replaces runs of non-alphanumeric characters with a single
/// hyphen, and trims leading/trailing hyphens. Titles that normalize to
/// nothing (e.g. all punctuation) fall back to `"post"` so the caller always
/// has a usable base for uniqueness resolution.
#[must_use]
pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    let slug = NON_ALNUM.replace_all(&lower, "-");
    let slug = slug.trim_matches('-');

    let mut slug = slug.to_string();
    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        // Don't end mid-word on a hyphen
        while slug.ends_with('-') {
            slug.pop();
        }
    }

    if slug.is_empty() {
        "post".to_string()
    } else {
        slug
    }
}

/// Normalize a title for duplicate detection within a batch.
///
/// Two topics are considered duplicates when their normalized titles match.
#[must_use]
pub fn normalize_title(title: &str) -> String {
    slugify(title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Rust in 2026: What's Next?"), "rust-in-2026-what-s-next");
    }

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("a  --  b"), "a-b");
        assert_eq!(slugify("--leading and trailing--"), "leading-and-trailing");
    }

    #[test]
    fn test_slugify_empty_falls_back() {
        assert_eq!(slugify(""), "post");
        assert_eq!(slugify("!!!"), "post");
    }

    #[test]
    fn test_slugify_truncates_long_titles() {
        let long = "word ".repeat(40);
        let slug = slugify(&long);
        assert!(slug.len() <= 80);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn test_normalize_title_matches_case_variants() {
        assert_eq!(normalize_title("Rust Async!"), normalize_title("rust async"));
    }
}
