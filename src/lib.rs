// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod events;
pub mod history;
pub mod ingest;
pub mod notify;
pub mod pacing;
pub mod pipeline;

// ---- Re-exports for stable public API ----
pub use crate::config::AppConfig;
pub use crate::events::{
    PipelineEvent, PipelineObserver, Stage, TracingObserver, DEFAULT_LOG_FILTER,
};
pub use crate::history::{JsonFileHistory, MemoryHistory, SentHistory};
pub use crate::ingest::types::{Article, KeywordSpec, SearchProvider};
pub use crate::notify::{Notifier, TelegramNotifier};
pub use crate::pipeline::{DeliveryPipeline, PipelineConfig, PipelineError, RunSummary};

use crate::ingest::providers::{
    google_news_rss::GoogleNewsRssProvider, naver_api::NaverNewsProvider, FallbackSearch,
};

/// Search stack for a config: Naver API with RSS fallback when Naver
/// credentials are present, RSS alone otherwise.
pub fn build_search_provider(cfg: &AppConfig) -> Box<dyn SearchProvider> {
    match &cfg.naver {
        Some(naver) => Box::new(FallbackSearch::new(
            Box::new(NaverNewsProvider::new(
                naver.client_id.clone(),
                naver.client_secret.clone(),
            )),
            Box::new(GoogleNewsRssProvider::new()),
        )),
        None => Box::new(GoogleNewsRssProvider::new()),
    }
}

/// Wire the production collaborators for `cfg` into a pipeline.
pub fn build_pipeline(cfg: &AppConfig) -> anyhow::Result<DeliveryPipeline<JsonFileHistory>> {
    let history = JsonFileHistory::open(&cfg.storage_location)?;
    let notifier =
        TelegramNotifier::new(cfg.telegram.bot_token.clone(), cfg.telegram.chat_id.clone());
    Ok(DeliveryPipeline::new(
        cfg.pipeline_config(),
        build_search_provider(cfg),
        Box::new(notifier),
        history,
    ))
}
