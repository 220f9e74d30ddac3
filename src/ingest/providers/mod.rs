// src/ingest/providers/mod.rs
pub mod google_news_rss;
pub mod naver_api;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use crate::ingest::types::{Article, SearchProvider};

/// RFC 2822 feed date normalized to UTC; `None` when unparseable.
pub(crate) fn parse_rfc2822_utc(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    // Feeds still use the obsolete zone names.
    let numeric = ["GMT", "UTC", "UT"]
        .iter()
        .find_map(|zone| ts.strip_suffix(zone).filter(|rest| rest.ends_with(' ')))
        .map(|rest| format!("{rest}+0000"));
    let dt = OffsetDateTime::parse(numeric.as_deref().unwrap_or(ts), &Rfc2822)
        .ok()?
        .to_offset(UtcOffset::UTC);
    DateTime::from_timestamp(dt.unix_timestamp(), dt.nanosecond())
}

/// Uses `primary` and falls back to `fallback` when it errors.
pub struct FallbackSearch {
    primary: Box<dyn SearchProvider>,
    fallback: Box<dyn SearchProvider>,
}

impl FallbackSearch {
    pub fn new(primary: Box<dyn SearchProvider>, fallback: Box<dyn SearchProvider>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl SearchProvider for FallbackSearch {
    async fn search(&self, term: &str, limit: usize) -> Result<Vec<Article>> {
        match self.primary.search(term, limit).await {
            Ok(v) => Ok(v),
            Err(e) => {
                tracing::warn!(
                    error = %format!("{e:#}"),
                    provider = self.primary.name(),
                    fallback = self.fallback.name(),
                    "search provider failed, using fallback"
                );
                self.fallback.search(term, limit).await
            }
        }
    }

    fn name(&self) -> &'static str {
        self.primary.name()
    }
}
