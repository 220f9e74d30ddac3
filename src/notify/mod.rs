// src/notify/mod.rs
pub mod format;
pub mod telegram;

use anyhow::Result;

use crate::ingest::types::Article;
use crate::pipeline::RunSummary;

pub use telegram::TelegramNotifier;

/// Downstream channel for article notifications.
///
/// Every method reports failure through `Err`; callers decide whether a
/// failure is fatal.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Cheap reachability/credential check done before a run.
    async fn test_connection(&self) -> Result<()>;
    async fn deliver(&self, article: &Article) -> Result<()>;
    async fn deliver_summary(&self, summary: &RunSummary) -> Result<()>;
    fn name(&self) -> &'static str;
}
