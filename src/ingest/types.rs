// src/ingest/types.rs
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// One news item as returned by a search provider.
///
/// `identity` is the canonical link and the only field used for dedup and
/// delivery history. `published_at` is `None` when the source gave no usable
/// timestamp.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Article {
    pub identity: String,
    pub title: String,
    pub description: String,
    pub published_at: Option<DateTime<Utc>>,
    pub source: String,
}

impl Article {
    /// Title and description joined the way keyword filters look at them.
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}

/// A configured search keyword.
///
/// In TOML a plain string is `Single`, an array of strings is `AllOf`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum KeywordSpec {
    Single(String),
    /// All terms must co-occur; only the first one is sent to the provider.
    AllOf(Vec<String>),
}

impl KeywordSpec {
    /// Term passed to the search provider.
    pub fn search_term(&self) -> &str {
        match self {
            KeywordSpec::Single(term) => term,
            KeywordSpec::AllOf(terms) => terms.first().map(String::as_str).unwrap_or_default(),
        }
    }

    /// Whether a candidate returned for this spec survives its term filter.
    /// `Single` specs accept whatever the provider matched.
    pub fn matches(&self, article: &Article) -> bool {
        match self {
            KeywordSpec::Single(_) => true,
            KeywordSpec::AllOf(terms) => {
                let haystack = article.searchable_text().to_lowercase();
                terms
                    .iter()
                    .all(|t| haystack.contains(t.to_lowercase().as_str()))
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let terms: &[String] = match self {
            KeywordSpec::Single(term) => std::slice::from_ref(term),
            KeywordSpec::AllOf(terms) => terms,
        };
        if terms.is_empty() {
            return Err(anyhow!("compound keyword must contain at least one term"));
        }
        if terms.iter().any(|t| t.trim().is_empty()) {
            return Err(anyhow!("keyword `{self}` contains an empty term"));
        }
        Ok(())
    }

    /// Parse a list like `한국투자증권;디에스자산운용+장덕수`.
    pub fn parse_list(s: &str) -> Result<Vec<KeywordSpec>> {
        s.split([';', ','])
            .filter(|part| !part.trim().is_empty())
            .map(str::parse)
            .collect()
    }
}

impl FromStr for KeywordSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let terms: Vec<String> = s.split('+').map(|t| t.trim().to_string()).collect();
        let spec = match terms.len() {
            1 => KeywordSpec::Single(terms.into_iter().next().unwrap_or_default()),
            _ => KeywordSpec::AllOf(terms),
        };
        spec.validate()?;
        Ok(spec)
    }
}

impl fmt::Display for KeywordSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeywordSpec::Single(term) => f.write_str(term),
            KeywordSpec::AllOf(terms) => f.write_str(&terms.join(" + ")),
        }
    }
}

#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    /// Up to `limit` candidates for `term`, newest first where the source allows.
    async fn search(&self, term: &str, limit: usize) -> Result<Vec<Article>>;
    fn name(&self) -> &'static str;
}
