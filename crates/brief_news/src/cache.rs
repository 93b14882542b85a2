//! Short-lived memo of raw fetch results per keyword set. Best effort only;
//! staleness is the single correctness concern, so entries past the TTL are
//! never handed back.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{NaiveDate, Utc};
use sha2::{Digest, Sha256};
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use brief_core::{Error, NewsArticle, Result};

pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

struct CacheEntry {
    articles: Vec<NewsArticle>,
    written_at: Instant,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    pub size: usize,
    pub oldest_age: Option<Duration>,
    pub newest_age: Option<Duration>,
}

pub struct NewsCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    ttl: Duration,
}

impl NewsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Deterministic key: SHA-256 over the sorted, pipe-joined keyword list
    /// plus a day bucket. Independent of keyword input order.
    pub fn cache_key(keywords: &[String], date: Option<NaiveDate>) -> String {
        let mut sorted: Vec<&str> = keywords.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        let day = date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "today".to_string());
        let combined = format!("{}:{}", sorted.join("|"), day);

        let mut hasher = Sha256::new();
        hasher.update(combined.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Returns the cached articles unless the entry is older than the TTL.
    /// Expired entries are evicted on the spot.
    pub async fn get(&self, key: &str) -> Option<Vec<NewsArticle>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.written_at.elapsed() <= self.ttl => {
                    return Some(entry.articles.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Entry exists but expired; evict lazily.
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(key) {
            if entry.written_at.elapsed() > self.ttl {
                entries.remove(key);
                debug!(key, "evicted expired cache entry");
            }
        }
        None
    }

    pub async fn set(&self, key: &str, articles: Vec<NewsArticle>) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            CacheEntry {
                articles,
                written_at: Instant::now(),
            },
        );
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn sweep_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.written_at.elapsed() <= self.ttl);
        before - entries.len()
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.read().await;
        let mut oldest_age = None;
        let mut newest_age = None;
        for entry in entries.values() {
            let age = entry.written_at.elapsed();
            if oldest_age.map_or(true, |oldest| age > oldest) {
                oldest_age = Some(age);
            }
            if newest_age.map_or(true, |newest| age < newest) {
                newest_age = Some(age);
            }
        }
        CacheStats {
            size: entries.len(),
            oldest_age,
            newest_age,
        }
    }

    /// Spawns the periodic eviction sweep as an owned background task. The
    /// returned handle cancels it at shutdown.
    pub fn spawn_sweeper(&self, interval: Duration) -> SweeperHandle {
        let entries = self.entries.clone();
        let ttl = self.ttl;
        let (cancel_tx, mut cancel_rx) = broadcast::channel(1);

        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = cancel_rx.recv() => {
                        info!("cache sweeper shutdown requested");
                        break;
                    }
                    _ = ticker.tick() => {
                        let mut entries = entries.write().await;
                        let before = entries.len();
                        entries.retain(|_, entry| entry.written_at.elapsed() <= ttl);
                        let swept = before - entries.len();
                        if swept > 0 {
                            debug!(swept, "swept expired cache entries");
                        }
                    }
                }
            }
        });

        SweeperHandle { cancel_tx, join }
    }
}

impl Default for NewsCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

pub struct SweeperHandle {
    cancel_tx: broadcast::Sender<()>,
    join: JoinHandle<()>,
}

impl SweeperHandle {
    pub async fn stop(self) -> Result<()> {
        let _ = self.cancel_tx.send(());
        self.join
            .await
            .map_err(|e| Error::Store(format!("cache sweeper task failed: {}", e)))
    }
}
