// src/ingest/recency.rs
use chrono::{DateTime, Duration, Utc};

use crate::ingest::types::Article;

/// Trailing window of `hours` at millisecond precision. Non-finite or
/// negative input yields a zero window.
pub fn window_duration(hours: f64) -> Duration {
    if !hours.is_finite() || hours <= 0.0 {
        return Duration::zero();
    }
    let ms = (hours * 3_600_000.0).round().min(i64::MAX as f64) as i64;
    Duration::try_milliseconds(ms).unwrap_or(Duration::MAX)
}

pub fn filter_recent(articles: Vec<Article>, window_hours: f64) -> Vec<Article> {
    filter_recent_at(articles, window_hours, Utc::now())
}

/// Keep articles published at or after `now - window_hours`.
///
/// Articles without a usable timestamp are kept: a broken feed date must not
/// cost a notification.
pub fn filter_recent_at(
    articles: Vec<Article>,
    window_hours: f64,
    now: DateTime<Utc>,
) -> Vec<Article> {
    let cutoff = now
        .checked_sub_signed(window_duration(window_hours))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    articles
        .into_iter()
        .filter(|a| a.published_at.map_or(true, |ts| ts >= cutoff))
        .collect()
}
