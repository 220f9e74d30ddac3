// src/notify/telegram.rs
use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::format::{format_article, format_summary};
use super::Notifier;
use crate::ingest::types::Article;
use crate::pacing::Pacer;
use crate::pipeline::RunSummary;

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
    timeout: Duration,
    pacer: Pacer,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self {
            client: Client::new(),
            api_base: TELEGRAM_API_BASE.to_string(),
            bot_token,
            chat_id,
            timeout: Duration::from_secs(10),
            pacer: Pacer::new(Duration::from_secs(1)),
        }
    }

    /// Point at a different API host (mock servers in tests).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Minimum gap between two messages.
    pub fn with_min_interval(mut self, gap: Duration) -> Self {
        self.pacer = Pacer::new(gap);
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.api_base.trim_end_matches('/'),
            self.bot_token,
            method
        )
    }

    async fn send_message(&self, text: String, link_preview: bool) -> Result<()> {
        self.pacer.wait_turn().await;
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: "MarkdownV2",
            disable_web_page_preview: !link_preview,
        };
        let rsp: ApiResponse<serde_json::Value> = self
            .client
            .post(self.method_url("sendMessage"))
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .context("telegram sendMessage")?
            .error_for_status()
            .context("telegram sendMessage non-2xx")?
            .json()
            .await
            .context("telegram sendMessage body")?;
        rsp.into_result().map(|_| ())
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn test_connection(&self) -> Result<()> {
        let rsp: ApiResponse<BotUser> = self
            .client
            .get(self.method_url("getMe"))
            .timeout(self.timeout)
            .send()
            .await
            .context("telegram getMe")?
            .error_for_status()
            .context("telegram getMe non-2xx")?
            .json()
            .await
            .context("telegram getMe body")?;
        let bot = rsp.into_result()?;
        tracing::info!(
            username = bot.username.as_deref().unwrap_or("unknown"),
            "telegram bot reachable"
        );
        Ok(())
    }

    async fn deliver(&self, article: &Article) -> Result<()> {
        self.send_message(format_article(article), true).await
    }

    async fn deliver_summary(&self, summary: &RunSummary) -> Result<()> {
        self.send_message(format_summary(summary), false).await
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: String,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T> {
        match (self.ok, self.result) {
            (true, Some(r)) => Ok(r),
            _ => Err(anyhow!(
                "telegram api error: {}",
                self.description.as_deref().unwrap_or("ok=false")
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BotUser {
    username: Option<String>,
}
