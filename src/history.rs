//! history.rs: record of delivered articles, keyed by article identity.
//!
//! An entry exists only for an article whose delivery was confirmed. The file
//! store persists on every change so that a crash right after a send never
//! loses the record.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Store of already-delivered identities.
pub trait SentHistory: Send {
    fn exists(&self, identity: &str) -> bool;

    /// Record a confirmed delivery. Persisted before returning.
    fn mark_sent_at(&mut self, identity: &str, at: DateTime<Utc>) -> Result<()>;

    fn mark_sent(&mut self, identity: &str) -> Result<()> {
        self.mark_sent_at(identity, Utc::now())
    }

    /// Drop entries sent before `now - retention_days`. Returns how many went.
    fn purge_older_than_at(&mut self, retention_days: f64, now: DateTime<Utc>) -> Result<usize>;

    fn purge_older_than(&mut self, retention_days: f64) -> Result<usize> {
        self.purge_older_than_at(retention_days, Utc::now())
    }

    /// Re-read the backing store.
    fn load(&mut self) -> Result<()>;

    fn save(&self) -> Result<()>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Stored `sentAt` stamp. Accepts RFC 3339 and naive ISO-8601 (read as UTC).
pub fn parse_sent_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|n| n.and_utc())
}

fn format_sent_at(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn retention_cutoff(retention_days: f64, now: DateTime<Utc>) -> DateTime<Utc> {
    let days = if retention_days.is_finite() {
        retention_days.max(0.0)
    } else {
        0.0
    };
    let secs = (days * 86_400.0).round().min(i64::MAX as f64) as i64;
    Duration::try_seconds(secs)
        .and_then(|d| now.checked_sub_signed(d))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Remove expired entries in place. Unparseable stamps count as expired.
fn purge_entries(
    entries: &mut BTreeMap<String, String>,
    retention_days: f64,
    now: DateTime<Utc>,
) -> usize {
    let cutoff = retention_cutoff(retention_days, now);
    let before = entries.len();
    entries.retain(|_, raw| parse_sent_at(raw).is_some_and(|ts| ts >= cutoff));
    before - entries.len()
}

/// In-memory store, for tests and embedding hosts that persist elsewhere.
#[derive(Debug, Default, Clone)]
pub struct MemoryHistory {
    entries: BTreeMap<String, String>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_at(&self, identity: &str) -> Option<DateTime<Utc>> {
        self.entries.get(identity).and_then(|raw| parse_sent_at(raw))
    }
}

impl SentHistory for MemoryHistory {
    fn exists(&self, identity: &str) -> bool {
        self.entries.contains_key(identity)
    }

    fn mark_sent_at(&mut self, identity: &str, at: DateTime<Utc>) -> Result<()> {
        self.entries
            .insert(identity.to_string(), format_sent_at(at));
        Ok(())
    }

    fn purge_older_than_at(&mut self, retention_days: f64, now: DateTime<Utc>) -> Result<usize> {
        Ok(purge_entries(&mut self.entries, retention_days, now))
    }

    fn load(&mut self) -> Result<()> {
        Ok(())
    }

    fn save(&self) -> Result<()> {
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// JSON object `{ "<url>": "<sentAt>" }` on disk.
///
/// A missing file is created empty; a file that does not parse is logged and
/// treated as empty. Writes go to a sibling temp file which is synced and then
/// renamed over the original.
#[derive(Debug)]
pub struct JsonFileHistory {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileHistory {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let mut store = Self {
            path: path.into(),
            entries: BTreeMap::new(),
        };
        store.load()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sent_at(&self, identity: &str) -> Option<DateTime<Utc>> {
        self.entries.get(identity).and_then(|raw| parse_sent_at(raw))
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "sent_articles.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn ensure_parent(&self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating history dir {}", dir.display()))?;
        }
        Ok(())
    }
}

impl SentHistory for JsonFileHistory {
    fn exists(&self, identity: &str) -> bool {
        self.entries.contains_key(identity)
    }

    fn mark_sent_at(&mut self, identity: &str, at: DateTime<Utc>) -> Result<()> {
        let previous = self
            .entries
            .insert(identity.to_string(), format_sent_at(at));
        if let Err(e) = self.save() {
            // Keep memory in line with what is on disk.
            match previous {
                Some(p) => self.entries.insert(identity.to_string(), p),
                None => self.entries.remove(identity),
            };
            return Err(e);
        }
        Ok(())
    }

    fn purge_older_than_at(&mut self, retention_days: f64, now: DateTime<Utc>) -> Result<usize> {
        let mut kept = self.entries.clone();
        let removed = purge_entries(&mut kept, retention_days, now);
        if removed > 0 {
            let previous = std::mem::replace(&mut self.entries, kept);
            if let Err(e) = self.save() {
                self.entries = previous;
                return Err(e);
            }
        }
        Ok(removed)
    }

    fn load(&mut self) -> Result<()> {
        let content = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.entries.clear();
                self.save()?;
                tracing::info!(path = %self.path.display(), "created empty sent history");
                return Ok(());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("reading sent history {}", self.path.display()))
            }
        };

        self.entries = match serde_json::from_str::<BTreeMap<String, String>>(&content) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "sent history unreadable, starting empty"
                );
                BTreeMap::new()
            }
        };
        tracing::info!(path = %self.path.display(), entries = self.entries.len(), "sent history loaded");
        Ok(())
    }

    fn save(&self) -> Result<()> {
        self.ensure_parent()?;
        let body = serde_json::to_vec_pretty(&self.entries).context("serializing sent history")?;
        let tmp = self.tmp_path();
        {
            let mut f = fs::File::create(&tmp)
                .with_context(|| format!("creating {}", tmp.display()))?;
            f.write_all(&body)
                .with_context(|| format!("writing {}", tmp.display()))?;
            f.sync_all()
                .with_context(|| format!("syncing {}", tmp.display()))?;
        }
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
