//! Time-boxed memoisation of derived reports.
//!
//! Entries expire a fixed TTL after they were written. There is no capacity
//! bound and no eviction other than expiry; concurrent writers to the same key
//! race and the last one wins.

use std::{collections::HashMap, time::Duration};

use chrono::NaiveDate;
use serde::Deserialize;
use tokio::{sync::RwLock, time::Instant};
use tracing::debug;
use uuid::Uuid;

use crate::range::DateRange;

// ─── Configuration ───────────────────────────────────────────────────────────

fn default_ttl_secs() -> u64 { 3600 }

fn default_purge_interval_secs() -> u64 { 300 }

/// Upper bound on an entry's lifetime (about a century). Longer configured
/// TTLs are clamped so expiry instants stay representable.
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Cache settings, deserialised from the `[cache]` table of `config.toml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CacheConfig {
  /// Lifetime of every entry.
  #[serde(default = "default_ttl_secs")]
  pub ttl_secs:            u64,
  /// How often the server sweeps expired entries out of memory.
  #[serde(default = "default_purge_interval_secs")]
  pub purge_interval_secs: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      ttl_secs:            default_ttl_secs(),
      purge_interval_secs: default_purge_interval_secs(),
    }
  }
}

impl CacheConfig {
  pub fn ttl(&self) -> Duration { Duration::from_secs(self.ttl_secs) }

  pub fn purge_interval(&self) -> Duration {
    Duration::from_secs(self.purge_interval_secs.max(1))
  }
}

// ─── Keys ────────────────────────────────────────────────────────────────────

/// Which derived report a cache entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
  Overall,
  Range,
}

/// `(kind, student, subject?, start?, end?)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
  pub kind:       ReportKind,
  pub student_id: Uuid,
  pub subject_id: Option<Uuid>,
  pub start:      Option<NaiveDate>,
  pub end:        Option<NaiveDate>,
}

impl CacheKey {
  pub fn overall(student_id: Uuid) -> Self {
    Self {
      kind: ReportKind::Overall,
      student_id,
      subject_id: None,
      start: None,
      end: None,
    }
  }

  pub fn range(student_id: Uuid, subject_id: Uuid, range: DateRange) -> Self {
    Self {
      kind: ReportKind::Range,
      student_id,
      subject_id: Some(subject_id),
      start: Some(range.start()),
      end: Some(range.end()),
    }
  }
}

// ─── Cache ───────────────────────────────────────────────────────────────────

struct CacheEntry<V> {
  value:      V,
  expires_at: Instant,
}

impl<V> CacheEntry<V> {
  fn is_live(&self, now: Instant) -> bool { now < self.expires_at }
}

/// A shared key→value map with a fixed per-entry TTL.
///
/// Construct one at process start and hand it to whatever fronts the store;
/// there is no global instance.
pub struct ReportCache<V> {
  entries: RwLock<HashMap<CacheKey, CacheEntry<V>>>,
  ttl:     Duration,
}

impl<V: Clone> ReportCache<V> {
  pub fn new(config: &CacheConfig) -> Self { Self::with_ttl(config.ttl()) }

  pub fn with_ttl(ttl: Duration) -> Self {
    Self { entries: RwLock::new(HashMap::new()), ttl: ttl.min(MAX_TTL) }
  }

  pub fn ttl(&self) -> Duration { self.ttl }

  /// The stored value, if one exists and its TTL has not elapsed.
  pub async fn get(&self, key: &CacheKey) -> Option<V> {
    let entries = self.entries.read().await;
    let hit = entries
      .get(key)
      .filter(|entry| entry.is_live(Instant::now()))
      .map(|entry| entry.value.clone());
    debug!(
      kind = ?key.kind,
      student_id = %key.student_id,
      hit = hit.is_some(),
      "report cache lookup"
    );
    hit
  }

  /// Store `value` under `key`, replacing any previous entry.
  pub async fn put(&self, key: CacheKey, value: V) {
    let entry = CacheEntry { value, expires_at: Instant::now() + self.ttl };
    self.entries.write().await.insert(key, entry);
  }

  /// Drop every entry whose TTL has elapsed. Returns how many were removed.
  pub async fn purge_expired(&self) -> usize {
    let now = Instant::now();
    let mut entries = self.entries.write().await;
    let before = entries.len();
    entries.retain(|_, entry| entry.is_live(now));
    before - entries.len()
  }

  /// Number of entries held, expired or not.
  pub async fn len(&self) -> usize { self.entries.read().await.len() }

  pub async fn is_empty(&self) -> bool { self.entries.read().await.is_empty() }
}
