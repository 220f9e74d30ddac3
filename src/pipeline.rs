//! Delivery pipeline: search → recency → already-sent → deliver → prune.
//!
//! Each successful delivery is recorded in the history store before the next
//! article is attempted, so an interrupted run never leaves a delivered
//! article unrecorded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::events::{PipelineEvent, PipelineObserver, Stage, TracingObserver};
use crate::history::SentHistory;
use crate::ingest::recency::filter_recent_at;
use crate::ingest::types::{Article, KeywordSpec, SearchProvider};
use crate::ingest::{aggregate, dedup_by_identity};
use crate::notify::Notifier;

/// Tunables the pipeline itself reads.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub keywords: Vec<KeywordSpec>,
    pub recency_window_hours: f64,
    pub max_articles_per_keyword: usize,
    pub retention_days: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_found: usize,
    pub total_recent: usize,
    pub sent: usize,
    pub skipped_duplicate: usize,
    pub failed: usize,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("notification channel unreachable: {0:#}")]
    NotifierUnreachable(anyhow::Error),
    /// The article went out but could not be recorded; continuing would risk
    /// repeats on the next run.
    #[error("delivered {identity} but failed to record it: {reason:#}")]
    Record {
        identity: String,
        reason: anyhow::Error,
    },
}

pub struct DeliveryPipeline<H: SentHistory> {
    config: PipelineConfig,
    search: Box<dyn SearchProvider>,
    notifier: Box<dyn Notifier>,
    history: H,
    observer: Arc<dyn PipelineObserver>,
}

impl<H: SentHistory> DeliveryPipeline<H> {
    pub fn new(
        config: PipelineConfig,
        search: Box<dyn SearchProvider>,
        notifier: Box<dyn Notifier>,
        history: H,
    ) -> Self {
        Self {
            config,
            search,
            notifier,
            history,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn into_history(self) -> H {
        self.history
    }

    fn emit(&self, event: PipelineEvent) {
        self.observer.on_event(&event);
    }

    pub async fn run(&mut self) -> Result<RunSummary, PipelineError> {
        self.run_at(Utc::now()).await
    }

    /// One full pass with `now` as the reference for recency and retention.
    pub async fn run_at(&mut self, now: DateTime<Utc>) -> Result<RunSummary, PipelineError> {
        let mut summary = RunSummary::default();

        self.emit(PipelineEvent::StageStarted(Stage::Connect));
        if let Err(e) = self.notifier.test_connection().await {
            self.emit(PipelineEvent::NotifierUnreachable {
                error: format!("{e:#}"),
            });
            return Err(PipelineError::NotifierUnreachable(e));
        }
        self.emit(PipelineEvent::NotifierReady);

        self.emit(PipelineEvent::StageStarted(Stage::Search));
        let found = aggregate(
            self.search.as_ref(),
            &self.config.keywords,
            self.config.max_articles_per_keyword,
            self.observer.as_ref(),
        )
        .await;
        let found = dedup_by_identity(found);
        summary.total_found = found.len();

        self.emit(PipelineEvent::StageStarted(Stage::Recency));
        let recent = filter_recent_at(found, self.config.recency_window_hours, now);
        summary.total_recent = recent.len();
        self.emit(PipelineEvent::Filtered {
            total_found: summary.total_found,
            total_recent: summary.total_recent,
        });

        self.emit(PipelineEvent::StageStarted(Stage::Dedup));
        let (already_sent, candidates): (Vec<Article>, Vec<Article>) = recent
            .into_iter()
            .partition(|a| self.history.exists(&a.identity));
        summary.skipped_duplicate = already_sent.len();
        self.emit(PipelineEvent::Partitioned {
            candidates: candidates.len(),
            skipped_duplicate: summary.skipped_duplicate,
        });

        self.emit(PipelineEvent::StageStarted(Stage::Deliver));
        for article in &candidates {
            match self.notifier.deliver(article).await {
                Ok(()) => {
                    if let Err(reason) = self.history.mark_sent_at(&article.identity, now) {
                        return Err(PipelineError::Record {
                            identity: article.identity.clone(),
                            reason,
                        });
                    }
                    summary.sent += 1;
                    self.emit(PipelineEvent::Delivered {
                        identity: article.identity.clone(),
                    });
                }
                Err(e) => {
                    summary.failed += 1;
                    self.emit(PipelineEvent::DeliveryFailed {
                        identity: article.identity.clone(),
                        error: format!("{e:#}"),
                    });
                }
            }
        }

        if summary.sent > 0 {
            self.emit(PipelineEvent::StageStarted(Stage::Summary));
            if let Err(e) = self.notifier.deliver_summary(&summary).await {
                self.emit(PipelineEvent::SummaryFailed {
                    error: format!("{e:#}"),
                });
            }
        }

        self.emit(PipelineEvent::StageStarted(Stage::Purge));
        match self
            .history
            .purge_older_than_at(self.config.retention_days, now)
        {
            Ok(removed) => self.emit(PipelineEvent::Purged { removed }),
            Err(e) => self.emit(PipelineEvent::PurgeFailed {
                error: format!("{e:#}"),
            }),
        }

        self.emit(PipelineEvent::Finished(summary));
        Ok(summary)
    }
}
