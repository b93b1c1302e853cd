//! Fingerprint-validated spreadsheet cache
//!
//! Owns one `CacheEntry` per (file path, sheet name). An entry is reused while
//! the file's current fingerprint matches the one recorded at load time and
//! its time-to-live has not run out; otherwise the sheet is re-read, re-indexed
//! and the new entry replaces the old one.
//!
//! A sheet the workbook lacks is remembered against the file's fingerprint,
//! so repeated lookups of it only probe the file until the file changes.
//!
//! Loads and fingerprint probes run on the blocking pool so async handlers
//! never parse spreadsheets on the scheduler. Concurrent misses on one key
//! share a single load.

mod fingerprint;
mod loader;

pub use fingerprint::{compute_hash, Fingerprint};
pub use loader::{load_entry, load_sheet, parse_sheet, table_from_range, LoadOutcome};

use crate::error::{RosterError, RosterResult};
use crate::header::Month;
use crate::index::TableIndex;
use crate::types::Table;
use lru::LruCache;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info};

//==============================================================================
// Options
//==============================================================================

/// Cache tuning. Built with explicit `with_*` setters.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheOptions {
    /// Entries older than this are reloaded on next access
    pub ttl: Duration,
    /// Maximum number of cached (file, sheet) entries
    pub capacity: usize,
    /// Re-hash file content on every freshness check
    pub verify_hash: bool,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(600),
            capacity: 64,
            verify_hash: true,
        }
    }
}

impl CacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_hash_verification(mut self, verify: bool) -> Self {
        self.verify_hash = verify;
        self
    }
}

//==============================================================================
// Entries
//==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub path: PathBuf,
    pub sheet: String,
}

impl CacheKey {
    pub fn new(path: &Path, sheet: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            sheet: sheet.to_string(),
        }
    }
}

/// One loaded sheet with its indices. Immutable once installed.
#[derive(Debug)]
pub struct CacheEntry {
    pub table: Arc<Table>,
    pub index: TableIndex,
    pub fingerprint: Fingerprint,
    pub loaded_at: Instant,
}

impl CacheEntry {
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.loaded_at.elapsed() >= ttl
    }
}

/// Counter snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub loads: u64,
    pub evictions: u64,
    pub entries: usize,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
    evictions: AtomicU64,
}

//==============================================================================
// Cache
//==============================================================================

type FlightLock = Arc<tokio::sync::Mutex<()>>;

/// A sheet found absent from the file state in `fingerprint`.
#[derive(Debug)]
struct MissingSheet {
    fingerprint: Fingerprint,
    checked_at: Instant,
}

pub struct SpreadsheetCache {
    options: CacheOptions,
    entries: Mutex<LruCache<CacheKey, Arc<CacheEntry>>>,
    missing: Mutex<LruCache<CacheKey, MissingSheet>>,
    flights: Mutex<HashMap<CacheKey, FlightLock>>,
    counters: Counters,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Run blocking file work off the async scheduler.
async fn run_blocking<T, F>(work: F) -> RosterResult<T>
where
    F: FnOnce() -> RosterResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| RosterError::Worker(e.to_string()))?
}

impl SpreadsheetCache {
    pub fn new(options: CacheOptions) -> Self {
        let capacity = NonZeroUsize::new(options.capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            options,
            entries: Mutex::new(LruCache::new(capacity)),
            missing: Mutex::new(LruCache::new(capacity)),
            flights: Mutex::new(HashMap::new()),
            counters: Counters::default(),
        }
    }

    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    /// Fresh entry for (path, sheet), loading it if absent, expired or stale.
    ///
    /// Fails with `FileUnavailable` when the file cannot be read or parsed and
    /// with `SheetNotFound` when the workbook has no such sheet.
    pub async fn get_entry(&self, path: &Path, sheet: &str) -> RosterResult<Arc<CacheEntry>> {
        let key = CacheKey::new(path, sheet);
        if let Some(entry) = self.fresh_entry(&key).await? {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            debug!(path = %path.display(), sheet, "cache hit");
            return Ok(entry);
        }
        if self.known_missing(&key).await? {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            return Err(sheet_not_found(&key));
        }

        let flight = self.flight_lock(&key);
        let _guard = flight.lock().await;

        // Another caller may have finished the load while we waited
        if let Some(entry) = self.fresh_entry(&key).await? {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            debug!(path = %path.display(), sheet, "cache hit after shared load");
            return Ok(entry);
        }
        if self.known_missing(&key).await? {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            return Err(sheet_not_found(&key));
        }
        self.counters.misses.fetch_add(1, Ordering::Relaxed);

        let started = Instant::now();
        let (load_path, load_sheet_name) = (key.path.clone(), key.sheet.clone());
        let outcome = match run_blocking(move || load_sheet(&load_path, &load_sheet_name)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                lock(&self.flights).remove(&key);
                return Err(e);
            }
        };
        self.counters.loads.fetch_add(1, Ordering::Relaxed);

        let entry = match outcome {
            LoadOutcome::Loaded(entry) => Arc::new(entry),
            LoadOutcome::SheetMissing(fingerprint) => {
                debug!(
                    path = %path.display(),
                    sheet,
                    hash = fingerprint.short_hash(),
                    "sheet absent from workbook"
                );
                let error = sheet_not_found(&key);
                lock(&self.flights).remove(&key);
                lock(&self.missing).put(
                    key,
                    MissingSheet {
                        fingerprint,
                        checked_at: Instant::now(),
                    },
                );
                return Err(error);
            }
        };

        info!(
            path = %path.display(),
            sheet,
            rows = entry.table.height(),
            names = entry.index.names.len(),
            days = entry.index.dates.len(),
            hash = entry.fingerprint.short_hash(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "sheet loaded"
        );

        lock(&self.missing).pop(&key);
        self.install(key, Arc::clone(&entry));
        Ok(entry)
    }

    pub async fn get_table(&self, path: &Path, sheet: &str) -> RosterResult<Arc<Table>> {
        Ok(Arc::clone(&self.get_entry(path, sheet).await?.table))
    }

    pub async fn get_row_for_name(
        &self,
        path: &Path,
        sheet: &str,
        name: &str,
    ) -> RosterResult<Option<usize>> {
        Ok(self.get_entry(path, sheet).await?.index.names.get(name))
    }

    pub async fn get_column_for_date(
        &self,
        path: &Path,
        sheet: &str,
        month: Month,
        day: u8,
    ) -> RosterResult<Option<usize>> {
        Ok(self.get_entry(path, sheet).await?.index.dates.column(month, day))
    }

    /// Drop every cached sheet of `path`. Returns how many entries went.
    ///
    /// Cached paths are compared after resolution, so `./schedule.xlsx` and
    /// an absolute path to the same file both match.
    pub fn invalidate(&self, path: &Path) -> usize {
        let target = resolve_path(path);
        let mut cached: HashSet<PathBuf> = lock(&self.entries)
            .iter()
            .map(|(key, _)| key.path.clone())
            .collect();
        cached.extend(lock(&self.missing).iter().map(|(key, _)| key.path.clone()));
        // Resolution touches the filesystem, so it runs outside the locks
        let matching: HashSet<PathBuf> = cached
            .into_iter()
            .filter(|cached| cached == path || resolve_path(cached) == target)
            .collect();

        let removed = {
            let mut entries = lock(&self.entries);
            let keys: Vec<CacheKey> = entries
                .iter()
                .filter(|(key, _)| matching.contains(&key.path))
                .map(|(key, _)| key.clone())
                .collect();
            for key in &keys {
                entries.pop(key);
            }
            keys.len()
        };
        {
            let mut missing = lock(&self.missing);
            let keys: Vec<CacheKey> = missing
                .iter()
                .filter(|(key, _)| matching.contains(&key.path))
                .map(|(key, _)| key.clone())
                .collect();
            for key in &keys {
                missing.pop(key);
            }
        }
        lock(&self.flights).retain(|key, _| !matching.contains(&key.path));
        debug!(path = %path.display(), removed, "cache invalidated");
        removed
    }

    pub fn clear(&self) {
        lock(&self.entries).clear();
        lock(&self.missing).clear();
        lock(&self.flights).clear();
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            loads: self.counters.loads.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    /// Cached entry for `key` if it is within its TTL and the file is unchanged.
    async fn fresh_entry(&self, key: &CacheKey) -> RosterResult<Option<Arc<CacheEntry>>> {
        let cached = lock(&self.entries).get(key).cloned();
        let Some(entry) = cached else {
            return Ok(None);
        };

        if entry.is_expired(self.options.ttl) {
            debug!(path = %key.path.display(), sheet = %key.sheet, "cache entry expired");
            return Ok(None);
        }

        let path = key.path.clone();
        let with_hash = self.options.verify_hash;
        let current = run_blocking(move || Fingerprint::probe(&path, with_hash)).await?;
        if entry.fingerprint.matches(&current) {
            Ok(Some(entry))
        } else {
            debug!(path = %key.path.display(), sheet = %key.sheet, "file changed since load");
            Ok(None)
        }
    }

    /// Whether `key` was found absent from the file as it still is now.
    async fn known_missing(&self, key: &CacheKey) -> RosterResult<bool> {
        let recorded = lock(&self.missing)
            .get(key)
            .map(|m| (m.fingerprint.clone(), m.checked_at));
        let Some((fingerprint, checked_at)) = recorded else {
            return Ok(false);
        };
        if checked_at.elapsed() >= self.options.ttl {
            return Ok(false);
        }

        let path = key.path.clone();
        let with_hash = self.options.verify_hash;
        let current = run_blocking(move || Fingerprint::probe(&path, with_hash)).await?;
        Ok(fingerprint.matches(&current))
    }

    fn flight_lock(&self, key: &CacheKey) -> FlightLock {
        Arc::clone(lock(&self.flights).entry(key.clone()).or_default())
    }

    fn install(&self, key: CacheKey, entry: Arc<CacheEntry>) {
        let displaced = lock(&self.entries).push(key.clone(), entry);
        if let Some((old_key, _)) = displaced {
            if old_key != key {
                self.counters.evictions.fetch_add(1, Ordering::Relaxed);
                lock(&self.flights).remove(&old_key);
                debug!(path = %old_key.path.display(), sheet = %old_key.sheet, "cache entry evicted");
            }
        }
    }
}

fn sheet_not_found(key: &CacheKey) -> RosterError {
    RosterError::SheetNotFound {
        path: key.path.clone(),
        sheet: key.sheet.clone(),
    }
}

/// Canonical form of `path`; a lexical cleanup of `.` and `..` when the file
/// is gone.
fn resolve_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    let mut resolved = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(resolved.components().next_back(), Some(Component::Normal(_))) {
                    resolved.pop();
                } else {
                    resolved.push(component);
                }
            }
            other => resolved.push(other),
        }
    }
    resolved
}

impl Default for SpreadsheetCache {
    fn default() -> Self {
        Self::new(CacheOptions::default())
    }
}
