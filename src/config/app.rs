// src/config/app.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::ingest::types::KeywordSpec;
use crate::pipeline::PipelineConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/newsbot.toml";
pub const ENV_CONFIG_PATH: &str = "NEWSBOT_CONFIG";

pub const ENV_KEYWORDS: &str = "NEWSBOT_KEYWORDS";
pub const ENV_RECENCY_WINDOW_HOURS: &str = "NEWSBOT_RECENCY_WINDOW_HOURS";
pub const ENV_MAX_ARTICLES_PER_KEYWORD: &str = "NEWSBOT_MAX_ARTICLES_PER_KEYWORD";
pub const ENV_RETENTION_DAYS: &str = "NEWSBOT_RETENTION_DAYS";
pub const ENV_STORAGE: &str = "NEWSBOT_STORAGE";

pub const ENV_TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";
pub const ENV_NAVER_CLIENT_ID: &str = "NAVER_CLIENT_ID";
pub const ENV_NAVER_CLIENT_SECRET: &str = "NAVER_CLIENT_SECRET";

fn default_recency_window_hours() -> f64 {
    1.0
}
fn default_max_articles_per_keyword() -> usize {
    20
}
fn default_retention_days() -> f64 {
    7.0
}
fn default_storage_location() -> PathBuf {
    PathBuf::from("data/sent_articles.json")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelegramCredentials {
    pub bot_token: String,
    pub chat_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NaverCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Fully resolved run configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub keywords: Vec<KeywordSpec>,
    pub recency_window_hours: f64,
    pub max_articles_per_keyword: usize,
    pub retention_days: f64,
    pub storage_location: PathBuf,
    pub telegram: TelegramCredentials,
    /// `None` selects the keyless RSS search.
    pub naver: Option<NaverCredentials>,
}

/// On-disk shape. Credential values of `"ENV"` (or absent) are read from the
/// environment.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    keywords: Vec<KeywordSpec>,
    #[serde(default = "default_recency_window_hours")]
    recency_window_hours: f64,
    #[serde(default = "default_max_articles_per_keyword")]
    max_articles_per_keyword: usize,
    #[serde(default = "default_retention_days")]
    retention_days: f64,
    #[serde(default = "default_storage_location")]
    storage_location: PathBuf,
    #[serde(default)]
    telegram: FileTelegram,
    #[serde(default)]
    naver: FileNaver,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileTelegram {
    bot_token: Option<String>,
    chat_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileNaver {
    client_id: Option<String>,
    client_secret: Option<String>,
}

/// File value wins unless it is missing, blank or the literal "ENV".
fn resolve_secret(file_value: Option<String>, env_key: &str) -> Option<String> {
    match file_value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() && !v.eq_ignore_ascii_case("env") => Some(v),
        _ => env::var(env_key)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()),
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow!("invalid {key}={v:?}: {e}")),
        _ => Ok(None),
    }
}

impl AppConfig {
    /// Parse a TOML config file and resolve it against the environment.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let file: FileConfig =
            toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
        Self::resolve(file)
    }

    /// Config lookup order:
    /// 1) explicit path (CLI)
    /// 2) $NEWSBOT_CONFIG
    /// 3) config/newsbot.toml
    /// 4) built-in defaults
    ///
    /// `NEWSBOT_*` environment overrides are applied on top in every case.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(p) = explicit {
            return Self::load_from_file(p);
        }
        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                bail!("{ENV_CONFIG_PATH} points to non-existent path {}", pb.display());
            }
            return Self::load_from_file(&pb);
        }
        let default = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default.exists() {
            return Self::load_from_file(&default);
        }
        Self::resolve(FileConfig {
            recency_window_hours: default_recency_window_hours(),
            max_articles_per_keyword: default_max_articles_per_keyword(),
            retention_days: default_retention_days(),
            storage_location: default_storage_location(),
            ..FileConfig::default()
        })
    }

    fn resolve(file: FileConfig) -> Result<Self> {
        let mut keywords = file.keywords;
        if let Ok(raw) = env::var(ENV_KEYWORDS) {
            if !raw.trim().is_empty() {
                keywords = KeywordSpec::parse_list(&raw)
                    .with_context(|| format!("parsing {ENV_KEYWORDS}"))?;
            }
        }

        let telegram = TelegramCredentials {
            bot_token: resolve_secret(file.telegram.bot_token, ENV_TELEGRAM_BOT_TOKEN)
                .unwrap_or_default(),
            chat_id: resolve_secret(file.telegram.chat_id, ENV_TELEGRAM_CHAT_ID)
                .unwrap_or_default(),
        };
        let naver = match (
            resolve_secret(file.naver.client_id, ENV_NAVER_CLIENT_ID),
            resolve_secret(file.naver.client_secret, ENV_NAVER_CLIENT_SECRET),
        ) {
            (Some(client_id), Some(client_secret)) => Some(NaverCredentials {
                client_id,
                client_secret,
            }),
            _ => None,
        };

        let cfg = Self {
            keywords,
            recency_window_hours: env_parse(ENV_RECENCY_WINDOW_HOURS)?
                .unwrap_or(file.recency_window_hours),
            max_articles_per_keyword: env_parse(ENV_MAX_ARTICLES_PER_KEYWORD)?
                .unwrap_or(file.max_articles_per_keyword),
            retention_days: env_parse(ENV_RETENTION_DAYS)?.unwrap_or(file.retention_days),
            storage_location: env::var(ENV_STORAGE)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(file.storage_location),
            telegram,
            naver,
        };
        Ok(cfg)
    }

    /// Replace keywords with CLI values. Each value is a list in the
    /// `NEWSBOT_KEYWORDS` syntax; no values leaves the config untouched.
    pub fn override_keywords(&mut self, raw: &[String]) -> Result<()> {
        let mut keywords = Vec::new();
        for value in raw {
            keywords.extend(
                KeywordSpec::parse_list(value)
                    .with_context(|| format!("parsing --keyword {value:?}"))?,
            );
        }
        if !keywords.is_empty() {
            self.keywords = keywords;
        }
        Ok(())
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.keywords.is_empty() {
            bail!("no keywords configured (set `keywords` or {ENV_KEYWORDS})");
        }
        for k in &self.keywords {
            k.validate()?;
        }
        if !(self.recency_window_hours.is_finite() && self.recency_window_hours > 0.0) {
            bail!(
                "recency_window_hours must be > 0, got {}",
                self.recency_window_hours
            );
        }
        if self.max_articles_per_keyword == 0 {
            bail!("max_articles_per_keyword must be >= 1");
        }
        if !(self.retention_days.is_finite() && self.retention_days >= 0.0) {
            bail!("retention_days must be >= 0, got {}", self.retention_days);
        }
        if self.telegram.bot_token.is_empty() || self.telegram.chat_id.is_empty() {
            bail!("telegram credentials missing ({ENV_TELEGRAM_BOT_TOKEN} / {ENV_TELEGRAM_CHAT_ID})");
        }
        Ok(())
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            keywords: self.keywords.clone(),
            recency_window_hours: self.recency_window_hours,
            max_articles_per_keyword: self.max_articles_per_keyword,
            retention_days: self.retention_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_defaults_fill_missing_fields() {
        let file: FileConfig = toml::from_str(r#"keywords = ["A"]"#).unwrap();
        assert_eq!(file.recency_window_hours, 1.0);
        assert_eq!(file.max_articles_per_keyword, 20);
        assert_eq!(file.retention_days, 7.0);
        assert_eq!(file.storage_location, PathBuf::from("data/sent_articles.json"));
    }

    #[test]
    fn integer_hours_are_accepted() {
        let file: FileConfig =
            toml::from_str("keywords = [\"A\"]\nrecency_window_hours = 3\nretention_days = 2")
                .unwrap();
        assert_eq!(file.recency_window_hours, 3.0);
        assert_eq!(file.retention_days, 2.0);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<FileConfig>("check_interval_minutes = 5").is_err());
    }

    #[test]
    fn literal_secret_beats_env_marker() {
        assert_eq!(
            resolve_secret(Some(" abc ".into()), "NEWSBOT_TEST_UNSET_VAR"),
            Some("abc".into())
        );
        assert_eq!(resolve_secret(Some("ENV".into()), "NEWSBOT_TEST_UNSET_VAR"), None);
    }

    fn valid() -> AppConfig {
        AppConfig {
            keywords: vec![KeywordSpec::Single("A".into())],
            recency_window_hours: 1.0,
            max_articles_per_keyword: 20,
            retention_days: 7.0,
            storage_location: default_storage_location(),
            telegram: TelegramCredentials {
                bot_token: "t".into(),
                chat_id: "c".into(),
            },
            naver: None,
        }
    }

    #[test]
    fn keyword_flags_split_like_the_env_list() {
        let mut c = valid();
        c.override_keywords(&["A,B".into(), "C+D".into()]).unwrap();
        assert_eq!(
            c.keywords,
            vec![
                KeywordSpec::Single("A".into()),
                KeywordSpec::Single("B".into()),
                KeywordSpec::AllOf(vec!["C".into(), "D".into()]),
            ]
        );

        let mut c = valid();
        c.override_keywords(&[]).unwrap();
        assert_eq!(c.keywords, vec![KeywordSpec::Single("A".into())]);

        assert!(valid().override_keywords(&["A+ ".into()]).is_err());
    }

    #[test]
    fn validation_catches_bad_values() {
        assert!(valid().validate().is_ok());

        let mut c = valid();
        c.keywords.clear();
        assert!(c.validate().is_err());

        let mut c = valid();
        c.recency_window_hours = 0.0;
        assert!(c.validate().is_err());

        let mut c = valid();
        c.max_articles_per_keyword = 0;
        assert!(c.validate().is_err());

        let mut c = valid();
        c.telegram.chat_id.clear();
        assert!(c.validate().is_err());
    }
}
