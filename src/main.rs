//! keyword-newsbot: one-shot entrypoint meant for cron / CI schedulers.
//! Searches the configured keywords, delivers new articles to Telegram and
//! exits. Exit code 1 only on configuration errors, an unreachable Telegram
//! bot, or a failure to record a delivery.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use keyword_newsbot::{build_pipeline, AppConfig, DEFAULT_LOG_FILTER};

#[derive(Debug, Parser)]
#[command(name = "keyword-newsbot", version, about)]
struct Cli {
    /// TOML config file (default: config/newsbot.toml when present).
    #[arg(long, env = "NEWSBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Keywords to watch; repeatable, and `a;b` or `a,b` lists work too.
    /// `a+b` requires both terms. Replaces configured keywords.
    #[arg(long = "keyword", value_name = "SPEC")]
    keywords: Vec<String>,

    /// Sent-history JSON file.
    #[arg(long)]
    storage: Option<PathBuf>,
}

/// Compact human logs by default; `NEWSBOT_LOG_FORMAT=json` for JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let json = std::env::var("NEWSBOT_LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

fn resolve_config(cli: Cli) -> anyhow::Result<AppConfig> {
    let mut cfg = AppConfig::load(cli.config.as_deref())?;
    cfg.override_keywords(&cli.keywords)?;
    if let Some(storage) = cli.storage {
        cfg.storage_location = storage;
    }
    cfg.validate()?;
    Ok(cfg)
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let cfg = match resolve_config(cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    for k in &cfg.keywords {
        tracing::info!(keyword = %k, "watching");
    }

    let mut pipeline = match build_pipeline(&cfg) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "startup failed");
            return ExitCode::FAILURE;
        }
    };

    match pipeline.run().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "run aborted");
            ExitCode::FAILURE
        }
    }
}
