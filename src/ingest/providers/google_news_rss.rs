// src/ingest/providers/google_news_rss.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use std::time::Duration;

use crate::ingest::normalize_text;
use crate::ingest::providers::parse_rfc2822_utc;
use crate::ingest::types::{Article, SearchProvider};

pub const GOOGLE_NEWS_BASE: &str = "https://news.google.com";
const DEFAULT_SOURCE: &str = "Google News";

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    source: Option<ItemSource>,
}

#[derive(Debug, Deserialize)]
struct ItemSource {
    #[serde(rename = "$text", default)]
    name: String,
}

/// Keyless search through the Google News RSS endpoint (Korean edition).
pub struct GoogleNewsRssProvider {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl Default for GoogleNewsRssProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl GoogleNewsRssProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: GOOGLE_NEWS_BASE.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base_url = base.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn parse_items_from_str(s: &str) -> Result<Vec<Article>> {
        let xml_clean = scrub_html_entities_for_xml(s);
        let rss: Rss = from_str(&xml_clean).context("parsing google news rss xml")?;

        let mut out = Vec::with_capacity(rss.channel.item.len());
        for it in rss.channel.item {
            let Some(link) = it.link.map(|l| l.trim().to_string()).filter(|l| !l.is_empty())
            else {
                continue;
            };
            let source = it
                .source
                .map(|s| normalize_text(&s.name))
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_SOURCE.to_string());

            // Titles come as "Headline - Publisher".
            let mut title = normalize_text(it.title.as_deref().unwrap_or_default());
            if let Some(stripped) = title.strip_suffix(&format!(" - {source}")) {
                title = stripped.to_string();
            }

            out.push(Article {
                identity: link,
                title,
                description: normalize_text(it.description.as_deref().unwrap_or_default()),
                published_at: it.pub_date.as_deref().and_then(parse_rfc2822_utc),
                source,
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl SearchProvider for GoogleNewsRssProvider {
    async fn search(&self, term: &str, limit: usize) -> Result<Vec<Article>> {
        let url = format!("{}/rss/search", self.base_url.trim_end_matches('/'));
        let body = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .query(&[("q", term), ("hl", "ko"), ("gl", "KR"), ("ceid", "KR:ko")])
            .send()
            .await
            .context("google news http get()")?
            .error_for_status()
            .context("google news non-2xx")?
            .text()
            .await
            .context("google news http .text()")?;

        let mut out = Self::parse_items_from_str(&body)?;
        out.truncate(limit);
        tracing::debug!(provider = "google_news_rss", term, count = out.len(), "rss search done");
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "google_news_rss"
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
