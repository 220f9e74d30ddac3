//! Progress events emitted by the aggregator and the delivery pipeline.
//!
//! The pipeline never prints; hosts route events wherever they like by
//! implementing [`PipelineObserver`]. [`TracingObserver`] is the default and
//! turns events into `tracing` records plus `metrics` counters.

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use tracing::{info, warn};

use crate::pipeline::RunSummary;

/// Default `EnvFilter` directive. Pipeline events log under the `pipeline`
/// target, so it is named explicitly.
pub const DEFAULT_LOG_FILTER: &str = "keyword_newsbot=info,pipeline=info,warn";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Connect,
    Search,
    Recency,
    Dedup,
    Deliver,
    Summary,
    Purge,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    StageStarted(Stage),
    NotifierReady,
    NotifierUnreachable { error: String },
    KeywordSearched { keyword: String, found: usize, kept: usize },
    KeywordFailed { keyword: String, error: String },
    Filtered { total_found: usize, total_recent: usize },
    Partitioned { candidates: usize, skipped_duplicate: usize },
    Delivered { identity: String },
    DeliveryFailed { identity: String, error: String },
    SummaryFailed { error: String },
    Purged { removed: usize },
    PurgeFailed { error: String },
    Finished(RunSummary),
}

pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: &PipelineEvent);
}

impl<F> PipelineObserver for F
where
    F: Fn(&PipelineEvent) + Send + Sync,
{
    fn on_event(&self, event: &PipelineEvent) {
        self(event)
    }
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "newsbot_keyword_searches_total",
            "Keyword searches answered by the search provider."
        );
        describe_counter!(
            "newsbot_keyword_failures_total",
            "Keyword searches that failed and contributed nothing."
        );
        describe_counter!(
            "newsbot_articles_sent_total",
            "Articles delivered and recorded in history."
        );
        describe_counter!(
            "newsbot_articles_failed_total",
            "Articles whose delivery failed."
        );
        describe_counter!(
            "newsbot_history_purged_total",
            "History entries removed by retention pruning."
        );
    });
}

/// Logs every event and keeps the `newsbot_*` counters up to date.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        ensure_metrics_described();
        match event {
            PipelineEvent::StageStarted(stage) => {
                tracing::debug!(target: "pipeline", ?stage, "stage started");
            }
            PipelineEvent::NotifierReady => info!(target: "pipeline", "notifier reachable"),
            PipelineEvent::NotifierUnreachable { error } => {
                tracing::error!(target: "pipeline", %error, "notifier unreachable");
            }
            PipelineEvent::KeywordSearched {
                keyword,
                found,
                kept,
            } => {
                counter!("newsbot_keyword_searches_total").increment(1);
                info!(target: "pipeline", %keyword, found, kept, "keyword searched");
            }
            PipelineEvent::KeywordFailed { keyword, error } => {
                counter!("newsbot_keyword_failures_total").increment(1);
                warn!(target: "pipeline", %keyword, %error, "keyword search failed");
            }
            PipelineEvent::Filtered {
                total_found,
                total_recent,
            } => info!(target: "pipeline", total_found, total_recent, "recency filter applied"),
            PipelineEvent::Partitioned {
                candidates,
                skipped_duplicate,
            } => info!(target: "pipeline", candidates, skipped_duplicate, "already-sent filter applied"),
            PipelineEvent::Delivered { identity } => {
                counter!("newsbot_articles_sent_total").increment(1);
                info!(target: "pipeline", %identity, "article delivered");
            }
            PipelineEvent::DeliveryFailed { identity, error } => {
                counter!("newsbot_articles_failed_total").increment(1);
                warn!(target: "pipeline", %identity, %error, "article delivery failed");
            }
            PipelineEvent::SummaryFailed { error } => {
                warn!(target: "pipeline", %error, "summary delivery failed");
            }
            PipelineEvent::Purged { removed } => {
                counter!("newsbot_history_purged_total").increment(*removed as u64);
                info!(target: "pipeline", removed, "history pruned");
            }
            PipelineEvent::PurgeFailed { error } => {
                warn!(target: "pipeline", %error, "history pruning failed");
            }
            PipelineEvent::Finished(s) => info!(
                target: "pipeline",
                total_found = s.total_found,
                total_recent = s.total_recent,
                sent = s.sent,
                skipped_duplicate = s.skipped_duplicate,
                failed = s.failed,
                "run finished"
            ),
        }
    }
}
