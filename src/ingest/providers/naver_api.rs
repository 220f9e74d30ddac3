// src/ingest/providers/naver_api.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::ingest::normalize_text;
use crate::ingest::providers::parse_rfc2822_utc;
use crate::ingest::types::{Article, SearchProvider};
use crate::pacing::Pacer;

pub const NAVER_NEWS_URL: &str = "https://openapi.naver.com/v1/search/news.json";
/// Largest `display` the API accepts.
pub const NAVER_MAX_DISPLAY: usize = 100;
const SOURCE_NAME: &str = "Naver News";

#[derive(Debug, Deserialize)]
struct NaverResponse {
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    originallink: String,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

/// Naver Open API news search (`sort=date`).
pub struct NaverNewsProvider {
    client: reqwest::Client,
    endpoint: String,
    client_id: String,
    client_secret: String,
    timeout: Duration,
    pacer: Pacer,
}

impl NaverNewsProvider {
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: NAVER_NEWS_URL.to_string(),
            client_id,
            client_secret,
            timeout: Duration::from_secs(10),
            pacer: Pacer::new(Duration::from_millis(500)),
        }
    }

    /// Point at a different endpoint (mock servers in tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_min_interval(mut self, gap: Duration) -> Self {
        self.pacer = Pacer::new(gap);
        self
    }

    pub fn parse_response(body: &str) -> Result<Vec<Article>> {
        let rsp: NaverResponse = serde_json::from_str(body).context("parsing naver news json")?;
        Ok(rsp.items.into_iter().filter_map(Self::to_article).collect())
    }

    fn to_article(it: Item) -> Option<Article> {
        let identity = if it.originallink.trim().is_empty() {
            it.link.trim().to_string()
        } else {
            it.originallink.trim().to_string()
        };
        if identity.is_empty() {
            return None;
        }
        Some(Article {
            identity,
            title: normalize_text(&it.title),
            description: normalize_text(&it.description),
            published_at: it.pub_date.as_deref().and_then(parse_rfc2822_utc),
            source: SOURCE_NAME.to_string(),
        })
    }
}

#[async_trait]
impl SearchProvider for NaverNewsProvider {
    async fn search(&self, term: &str, limit: usize) -> Result<Vec<Article>> {
        self.pacer.wait_turn().await;
        let display = limit.clamp(1, NAVER_MAX_DISPLAY).to_string();
        let body = self
            .client
            .get(&self.endpoint)
            .timeout(self.timeout)
            .header("X-Naver-Client-Id", &self.client_id)
            .header("X-Naver-Client-Secret", &self.client_secret)
            .query(&[("query", term), ("display", display.as_str()), ("sort", "date")])
            .send()
            .await
            .context("naver http get()")?
            .error_for_status()
            .context("naver non-2xx")?
            .text()
            .await
            .context("naver http .text()")?;

        let mut out = Self::parse_response(&body)?;
        out.truncate(limit);
        tracing::debug!(provider = "naver", term, count = out.len(), "naver search done");
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "naver"
    }
}
