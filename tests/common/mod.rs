// tests/common/mod.rs
// Scripted collaborators shared by the integration tests.
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use keyword_newsbot::{Article, Notifier, RunSummary, SearchProvider};

pub fn article(identity: &str, title: &str, published_at: Option<DateTime<Utc>>) -> Article {
    Article {
        identity: identity.to_string(),
        title: title.to_string(),
        description: String::new(),
        published_at,
        source: "test".to_string(),
    }
}

/// Returns canned results per search term; unknown terms yield nothing.
#[derive(Default, Clone)]
pub struct ScriptedSearch {
    results: Arc<Mutex<HashMap<String, Vec<Article>>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    pub calls: Arc<Mutex<Vec<(String, usize)>>>,
}

impl ScriptedSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, term: &str, articles: Vec<Article>) -> Self {
        self.results.lock().insert(term.to_string(), articles);
        self
    }

    pub fn failing(self, term: &str) -> Self {
        self.failing.lock().insert(term.to_string());
        self
    }
}

#[async_trait]
impl SearchProvider for ScriptedSearch {
    async fn search(&self, term: &str, limit: usize) -> Result<Vec<Article>> {
        self.calls.lock().push((term.to_string(), limit));
        if self.failing.lock().contains(term) {
            return Err(anyhow!("search backend down for {term}"));
        }
        let mut v = self.results.lock().get(term).cloned().unwrap_or_default();
        v.truncate(limit);
        Ok(v)
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Records deliveries; identities listed in `fail_on` are rejected.
#[derive(Default, Clone)]
pub struct RecordingNotifier {
    pub delivered: Arc<Mutex<Vec<String>>>,
    pub attempts: Arc<Mutex<Vec<String>>>,
    pub summaries: Arc<Mutex<Vec<RunSummary>>>,
    pub connection_checks: Arc<Mutex<usize>>,
    fail_on: Arc<Mutex<HashSet<String>>>,
    unreachable: bool,
    summary_fails: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(self, identity: &str) -> Self {
        self.fail_on.lock().insert(identity.to_string());
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub fn summary_fails(mut self) -> Self {
        self.summary_fails = true;
        self
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn test_connection(&self) -> Result<()> {
        *self.connection_checks.lock() += 1;
        if self.unreachable {
            return Err(anyhow!("getMe: 401 Unauthorized"));
        }
        Ok(())
    }

    async fn deliver(&self, article: &Article) -> Result<()> {
        self.attempts.lock().push(article.identity.clone());
        if self.fail_on.lock().contains(&article.identity) {
            return Err(anyhow!("sendMessage: 429 Too Many Requests"));
        }
        self.delivered.lock().push(article.identity.clone());
        Ok(())
    }

    async fn deliver_summary(&self, summary: &RunSummary) -> Result<()> {
        self.summaries.lock().push(*summary);
        if self.summary_fails {
            return Err(anyhow!("summary rejected"));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
