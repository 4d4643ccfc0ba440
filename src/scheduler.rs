//! In-process publish scheduler.
//!
//! Sleeps until the next configured publish time (UTC), runs a batch sized
//! from the daily quota, and keeps going. Failures are logged; the loop
//! never exits on its own.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Days, NaiveTime, Utc};
use tracing::{error, info};

use crate::config::Config;
use crate::pipeline::{BatchRequest, Pipeline, MAX_BATCH_SIZE};

/// Run the publish loop forever.
pub async fn run_loop(pipeline: Arc<Pipeline>, config: Config) {
    let slots = config.publish_times.len();
    let count = per_slot_count(config.posts_per_day, slots);

    info!(
        posts_per_day = config.posts_per_day,
        slots,
        per_slot = count,
        "Publish scheduler started"
    );

    loop {
        let wait = until_next_publish(&config.publish_times, Utc::now());
        info!(wait_secs = wait.as_secs(), "Sleeping until next publish slot");
        tokio::time::sleep(wait).await;

        let request = BatchRequest {
            count,
            validate_seo: None,
            min_seo_score: None,
        };

        let report = pipeline.run_batch(&request).await;
        if report.success {
            info!(
                generated = report.stats.generated,
                warnings = report.warnings.len(),
                "Scheduled batch complete"
            );
        } else {
            error!(
                errors = ?report.errors,
                "Scheduled batch produced no posts"
            );
        }
    }
}

/// Posts to generate per publish slot, at least one.
fn per_slot_count(posts_per_day: u32, slots: usize) -> usize {
    let slots = slots.max(1);
    let per_day = usize::try_from(posts_per_day).unwrap_or(1);
    per_day.div_ceil(slots).clamp(1, MAX_BATCH_SIZE)
}

/// Duration until the next configured publish time after `now`.
///
/// `times` must be sorted; when every slot for today has passed, the first
/// slot tomorrow is used.
fn until_next_publish(times: &[NaiveTime], now: DateTime<Utc>) -> Duration {
    let today = now.date_naive();
    let next = times
        .iter()
        .map(|t| today.and_time(*t).and_utc())
        .find(|candidate| *candidate > now)
        .or_else(|| {
            times.first().map(|t| {
                today
                    .checked_add_days(Days::new(1))
                    .unwrap_or(today)
                    .and_time(*t)
                    .and_utc()
            })
        });

    match next {
        Some(next) => (next - now).to_std().unwrap_or(Duration::from_secs(60)),
        // Unreachable with validated config; fall back to an hourly poll.
        None => Duration::from_secs(3600),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn times(specs: &[(u32, u32)]) -> Vec<NaiveTime> {
        specs
            .iter()
            .map(|(h, m)| NaiveTime::from_hms_opt(*h, *m, 0).unwrap())
            .collect()
    }

    #[test]
    fn test_next_slot_later_today() {
        let now = Utc.with_ymd_and_hms(2026, 8, 23, 8, 0, 0).unwrap();
        let wait = until_next_publish(&times(&[(9, 0), (15, 0)]), now);
        assert_eq!(wait, Duration::from_secs(3600));
    }

    #[test]
    fn test_next_slot_between_slots() {
        let now = Utc.with_ymd_and_hms(2026, 8, 23, 12, 0, 0).unwrap();
        let wait = until_next_publish(&times(&[(9, 0), (15, 0)]), now);
        assert_eq!(wait, Duration::from_secs(3 * 3600));
    }

    #[test]
    fn test_wraps_to_tomorrow() {
        let now = Utc.with_ymd_and_hms(2026, 8, 23, 20, 0, 0).unwrap();
        let wait = until_next_publish(&times(&[(9, 0), (15, 0)]), now);
        assert_eq!(wait, Duration::from_secs(13 * 3600));
    }

    #[test]
    fn test_per_slot_count() {
        assert_eq!(per_slot_count(2, 2), 1);
        assert_eq!(per_slot_count(3, 2), 2);
        assert_eq!(per_slot_count(1, 3), 1);
        // Clamped to the batch ceiling
        assert_eq!(per_slot_count(100, 1), MAX_BATCH_SIZE);
    }
}
