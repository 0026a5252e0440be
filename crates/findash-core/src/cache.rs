//! In-memory TTL cache of normalized records.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::{CanonicalRecord, StatementRequest, StatementType};

/// Defines how a single `fetch_statement` call uses the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Read from the cache if a non-expired entry is present;
    /// otherwise, fetch from the network and store the record. (Default)
    #[default]
    Use,
    /// Always fetch from the network, skipping any cached entry,
    /// and store the new record.
    Refresh,
    /// Always fetch from the network and neither read nor write the cache.
    Bypass,
}

impl CacheMode {
    pub const fn reads(self) -> bool {
        matches!(self, Self::Use)
    }

    pub const fn writes(self) -> bool {
        !matches!(self, Self::Bypass)
    }
}

/// Time-to-live policy per statement type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtl {
    pub quote: Duration,
    pub statement: Duration,
}

impl CacheTtl {
    pub const DEFAULT_QUOTE: Duration = Duration::from_secs(15 * 60);
    pub const DEFAULT_STATEMENT: Duration = Duration::from_secs(24 * 60 * 60);

    pub const fn new(quote: Duration, statement: Duration) -> Self {
        Self { quote, statement }
    }

    pub const fn for_type(&self, statement_type: StatementType) -> Duration {
        match statement_type {
            StatementType::Quote => self.quote,
            _ => self.statement,
        }
    }
}

impl Default for CacheTtl {
    fn default() -> Self {
        Self::new(Self::DEFAULT_QUOTE, Self::DEFAULT_STATEMENT)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    record: CanonicalRecord,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Shared handle to the record cache.
///
/// Clones share one map; create it once at startup and inject it into the
/// [`StatementService`](crate::StatementService). Expired entries are evicted
/// lazily by the lookup that finds them.
#[derive(Debug, Clone, Default)]
pub struct StatementCache {
    inner: Arc<tokio::sync::RwLock<HashMap<StatementRequest, CacheEntry>>>,
}

impl StatementCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached record for `req` if present and not expired.
    ///
    /// An expired entry counts as a miss and is removed.
    pub async fn get(&self, req: &StatementRequest) -> Option<CanonicalRecord> {
        {
            let map = self.inner.read().await;
            match map.get(req) {
                None => return None,
                Some(entry) if !entry.is_expired(Instant::now()) => {
                    return Some(entry.record.clone());
                }
                Some(_) => {}
            }
        }

        let mut map = self.inner.write().await;
        // Another writer may have refreshed the entry between the two locks.
        match map.get(req) {
            Some(entry) if !entry.is_expired(Instant::now()) => Some(entry.record.clone()),
            Some(_) => {
                map.remove(req);
                None
            }
            None => None,
        }
    }

    /// Store `record` under `req`, replacing any previous entry.
    pub async fn put(&self, req: StatementRequest, record: CanonicalRecord, ttl: Duration) {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .unwrap_or_else(Instant::now);
        let mut map = self.inner.write().await;
        map.insert(req, CacheEntry { record, expires_at });
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }
}
