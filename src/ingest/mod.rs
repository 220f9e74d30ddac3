// src/ingest/mod.rs
pub mod providers;
pub mod recency;
pub mod types;

use crate::events::{PipelineEvent, PipelineObserver};
use crate::ingest::types::{Article, KeywordSpec, SearchProvider};
use std::collections::HashSet;

/// Normalize provider text: decode entities, strip tags, fold whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags (search APIs wrap hits in <b>..</b>)
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out = out.trim().to_string();

    // 5) Length cap: 1500 chars
    if out.chars().count() > 1500 {
        out = out.chars().take(1500).collect();
    }

    out
}

/// Keep the first article per identity, preserving order.
pub fn dedup_by_identity(articles: Vec<Article>) -> Vec<Article> {
    let mut seen: HashSet<String> = HashSet::with_capacity(articles.len());
    articles
        .into_iter()
        .filter(|a| seen.insert(a.identity.clone()))
        .collect()
}

/// Run one search per spec and merge the results.
///
/// A failing spec contributes nothing; the remaining specs still run.
/// Compound specs drop candidates missing any of their terms. The merged
/// list keeps first-occurrence order across specs.
pub async fn aggregate(
    provider: &dyn SearchProvider,
    specs: &[KeywordSpec],
    per_spec_limit: usize,
    observer: &dyn PipelineObserver,
) -> Vec<Article> {
    let mut merged = Vec::new();
    for spec in specs {
        match provider.search(spec.search_term(), per_spec_limit).await {
            Ok(candidates) => {
                let found = candidates.len();
                let before = merged.len();
                merged.extend(candidates.into_iter().filter(|a| spec.matches(a)));
                observer.on_event(&PipelineEvent::KeywordSearched {
                    keyword: spec.to_string(),
                    found,
                    kept: merged.len() - before,
                });
            }
            Err(e) => {
                observer.on_event(&PipelineEvent::KeywordFailed {
                    keyword: spec.to_string(),
                    error: format!("{e:#}"),
                });
            }
        }
    }
    dedup_by_identity(merged)
}
