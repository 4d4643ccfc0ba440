use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveTime;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to parse {name} as boolean: {value}")]
    ParseBool { name: String, value: String },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Text generation
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub generation_timeout: Duration,

    // Image generation (cover images are skipped when no key is set)
    pub image_api_key: Option<String>,
    pub image_base_url: String,
    pub image_model: String,

    // Topic feeds
    pub news_api_key: Option<String>,
    pub news_api_url: String,
    pub trending_api_url: String,

    // Database
    pub database_path: PathBuf,

    // Pipeline policy
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    pub validate_seo: bool,
    pub min_seo_score: u8,
    pub strict_seo_validation: bool,

    // Publishing
    pub site_url: String,
    pub posts_per_day: u32,
    pub publish_times: Vec<NaiveTime>,
    pub scheduler_enabled: bool,
    pub cron_secret: Option<String>,

    // Web server
    pub web_host: String,
    pub web_port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Text generation
            openai_api_key: required_env("OPENAI_API_KEY")?,
            openai_base_url: env_or_default("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            openai_model: env_or_default("OPENAI_MODEL", "gpt-4o-mini"),
            generation_timeout: Duration::from_secs(parse_env_u64("GENERATION_TIMEOUT_SECS", 120)?),

            // Image generation
            image_api_key: optional_env("IMAGE_API_KEY"),
            image_base_url: env_or_default("IMAGE_BASE_URL", "https://api.openai.com/v1"),
            image_model: env_or_default("IMAGE_MODEL", "dall-e-3"),

            // Topic feeds
            news_api_key: optional_env("NEWS_API_KEY"),
            news_api_url: env_or_default("NEWS_API_URL", "https://newsapi.org/v2/top-headlines"),
            trending_api_url: env_or_default(
                "TRENDING_API_URL",
                "https://api.github.com/search/repositories",
            ),

            // Database
            database_path: PathBuf::from(env_or_default("DATABASE_PATH", "./data/blog.sqlite")),

            // Pipeline policy
            retry_attempts: parse_env_u32("RETRY_ATTEMPTS", 3)?,
            retry_delay: Duration::from_millis(parse_env_u64("RETRY_DELAY_MS", 2000)?),
            validate_seo: parse_env_bool("VALIDATE_SEO", true)?,
            min_seo_score: parse_env_u8("MIN_SEO_SCORE", 70)?,
            strict_seo_validation: parse_env_bool("STRICT_SEO_VALIDATION", false)?,

            // Publishing
            site_url: env_or_default("SITE_URL", "http://localhost:3000"),
            posts_per_day: parse_env_u32("POSTS_PER_DAY", 2)?,
            publish_times: parse_publish_times(&env_or_default("PUBLISH_TIMES", "09:00,15:00"))?,
            scheduler_enabled: parse_env_bool("SCHEDULER_ENABLED", false)?,
            cron_secret: optional_env("CRON_SECRET"),

            // Web server
            web_host: env_or_default("WEB_HOST", "0.0.0.0"),
            web_port: parse_env_u16("WEB_PORT", 8080)?,
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.openai_api_key.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "OPENAI_API_KEY".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self.retry_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                name: "RETRY_ATTEMPTS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.min_seo_score > 100 {
            return Err(ConfigError::InvalidValue {
                name: "MIN_SEO_SCORE".to_string(),
                message: "must be between 0 and 100".to_string(),
            });
        }
        if url::Url::parse(&self.site_url).is_err() {
            return Err(ConfigError::InvalidValue {
                name: "SITE_URL".to_string(),
                message: "must be an absolute URL".to_string(),
            });
        }
        if self.posts_per_day == 0 {
            return Err(ConfigError::InvalidValue {
                name: "POSTS_PER_DAY".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.publish_times.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "PUBLISH_TIMES".to_string(),
                message: "must list at least one HH:MM time".to_string(),
            });
        }
        if self.scheduler_enabled && self.cron_secret.is_none() {
            return Err(ConfigError::InvalidValue {
                name: "CRON_SECRET".to_string(),
                message: "required when SCHEDULER_ENABLED is set".to_string(),
            });
        }
        Ok(())
    }

    /// A configuration suitable for tests: no network credentials, fast retries.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            openai_api_key: "test-key".to_string(),
            openai_base_url: "http://127.0.0.1:0/v1".to_string(),
            openai_model: "test-model".to_string(),
            generation_timeout: Duration::from_secs(5),
            image_api_key: None,
            image_base_url: "http://127.0.0.1:0/v1".to_string(),
            image_model: "test-image-model".to_string(),
            news_api_key: None,
            news_api_url: "http://127.0.0.1:0/headlines".to_string(),
            trending_api_url: "http://127.0.0.1:0/repos".to_string(),
            database_path: PathBuf::from(":memory:"),
            retry_attempts: 3,
            retry_delay: Duration::from_millis(0),
            validate_seo: true,
            min_seo_score: 70,
            strict_seo_validation: false,
            site_url: "https://blog.example.com".to_string(),
            posts_per_day: 2,
            publish_times: vec![
                NaiveTime::from_hms_opt(9, 0, 0).expect("valid time"),
                NaiveTime::from_hms_opt(15, 0, 0).expect("valid time"),
            ],
            scheduler_enabled: false,
            cron_secret: Some("test-secret".to_string()),
            web_host: "127.0.0.1".to_string(),
            web_port: 0,
        }
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u32(name: &str, default: u32) -> Result<u32, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u16(name: &str, default: u16) -> Result<u16, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u8(name: &str, default: u8) -> Result<u8, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::ParseBool {
                name: name.to_string(),
                value: val,
            }),
        },
        _ => Ok(default),
    }
}

fn parse_publish_times(value: &str) -> Result<Vec<NaiveTime>, ConfigError> {
    let mut times = Vec::new();
    for part in value.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let time =
            NaiveTime::parse_from_str(part, "%H:%M").map_err(|_| ConfigError::InvalidValue {
                name: "PUBLISH_TIMES".to_string(),
                message: format!("expected HH:MM, got '{part}'"),
            })?;
        times.push(time);
    }
    times.sort_unstable();
    times.dedup();
    Ok(times)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_publish_times() {
        let times = parse_publish_times("09:00,15:30").unwrap();
        assert_eq!(times.len(), 2);
        assert_eq!(times[0], NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(times[1], NaiveTime::from_hms_opt(15, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_publish_times_sorts_and_dedups() {
        let times = parse_publish_times("15:00, 09:00,15:00").unwrap();
        assert_eq!(times.len(), 2);
        assert_eq!(times[0], NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_publish_times_rejects_garbage() {
        assert!(parse_publish_times("9am").is_err());
        assert!(parse_publish_times("25:00").is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_env_bool("NONEXISTENT_VAR", true).unwrap());
        assert!(!parse_env_bool("NONEXISTENT_VAR", false).unwrap());
    }

    #[test]
    fn test_for_testing_validates() {
        Config::for_testing().validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_relative_site_url() {
        let mut config = Config::for_testing();
        config.site_url = "/blog".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial_test::serial]
    fn test_from_env_requires_api_key() {
        std::env::remove_var("OPENAI_API_KEY");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::MissingEnvVar(_))
        ));
    }

    #[test]
    #[serial_test::serial]
    fn test_from_env_reads_overrides() {
        std::env::set_var("OPENAI_API_KEY", "key");
        std::env::set_var("RETRY_ATTEMPTS", "5");
        std::env::set_var("PUBLISH_TIMES", "06:30");

        let config = Config::from_env().unwrap();
        assert_eq!(config.retry_attempts, 5);
        assert_eq!(config.publish_times.len(), 1);
        assert_eq!(config.min_seo_score, 70);

        std::env::remove_var("OPENAI_API_KEY");
        std::env::remove_var("RETRY_ATTEMPTS");
        std::env::remove_var("PUBLISH_TIMES");
    }
}
