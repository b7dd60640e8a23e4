//! Persistence for saved matches and bank settings

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use super::cache::{Clock, TtlCache};
use crate::error::StoreError;
use crate::models::{BankSettings, SavedMatch};

const MATCHES_FILE: &str = "matches.json";
const SETTINGS_FILE: &str = "bank_settings.json";

/// How far a save got
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved,
    /// Written locally, the remote copy failed
    LocalOnly { warning: String },
}

impl SaveOutcome {
    pub fn warning(&self) -> Option<&str> {
        match self {
            SaveOutcome::Saved => None,
            SaveOutcome::LocalOnly { warning } => Some(warning),
        }
    }
}

/// Storage backend for the app's records
pub trait Store {
    fn load_matches(&self) -> Result<Vec<SavedMatch>, StoreError>;
    fn save_matches(&self, matches: &[SavedMatch]) -> Result<SaveOutcome, StoreError>;
    fn load_settings(&self) -> Result<Option<BankSettings>, StoreError>;
    fn save_settings(&self, settings: &BankSettings) -> Result<SaveOutcome, StoreError>;
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn load_matches(&self) -> Result<Vec<SavedMatch>, StoreError> {
        (**self).load_matches()
    }

    fn save_matches(&self, matches: &[SavedMatch]) -> Result<SaveOutcome, StoreError> {
        (**self).save_matches(matches)
    }

    fn load_settings(&self) -> Result<Option<BankSettings>, StoreError> {
        (**self).load_settings()
    }

    fn save_settings(&self, settings: &BankSettings) -> Result<SaveOutcome, StoreError> {
        (**self).save_settings(settings)
    }
}

/// JSON files in one directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, StoreError> {
        let path = self.dir.join(name);
        if !path.exists() {
            debug!("No file at {:?}", path);
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)?;
        let value = serde_json::from_str(&contents)?;
        Ok(Some(value))
    }

    /// Write to a temp file first, then rename over the target
    fn write<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;

        let path = self.dir.join(name);
        let contents = serde_json::to_string_pretty(value)?;
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, contents)?;
        fs::rename(&temp_path, &path)?;
        Ok(())
    }
}

impl Store for JsonFileStore {
    fn load_matches(&self) -> Result<Vec<SavedMatch>, StoreError> {
        let matches: Vec<SavedMatch> = self.read(MATCHES_FILE)?.unwrap_or_default();
        info!("Loaded {} saved matches from {:?}", matches.len(), self.dir);
        Ok(matches)
    }

    fn save_matches(&self, matches: &[SavedMatch]) -> Result<SaveOutcome, StoreError> {
        self.write(MATCHES_FILE, matches)?;
        info!("Saved {} matches to {:?}", matches.len(), self.dir);
        Ok(SaveOutcome::Saved)
    }

    fn load_settings(&self) -> Result<Option<BankSettings>, StoreError> {
        self.read(SETTINGS_FILE)
    }

    fn save_settings(&self, settings: &BankSettings) -> Result<SaveOutcome, StoreError> {
        self.write(SETTINGS_FILE, settings)?;
        info!("Saved bank settings to {:?}", self.dir);
        Ok(SaveOutcome::Saved)
    }
}

/// Local store is authoritative; the remote is a best-effort mirror
#[derive(Debug)]
pub struct LocalFirstStore<L, R> {
    local: L,
    remote: R,
}

impl<L: Store, R: Store> LocalFirstStore<L, R> {
    pub fn new(local: L, remote: R) -> Self {
        Self { local, remote }
    }

    fn mirror(&self, what: &str, result: Result<SaveOutcome, StoreError>) -> SaveOutcome {
        match result {
            Ok(_) => SaveOutcome::Saved,
            Err(e) => {
                warn!("Remote save of {} failed, kept local copy: {}", what, e);
                SaveOutcome::LocalOnly {
                    warning: format!("{} saved locally only: {}", what, e),
                }
            }
        }
    }
}

impl<L: Store, R: Store> Store for LocalFirstStore<L, R> {
    fn load_matches(&self) -> Result<Vec<SavedMatch>, StoreError> {
        let local = self.local.load_matches()?;
        if !local.is_empty() {
            return Ok(local);
        }

        match self.remote.load_matches() {
            Ok(remote) => Ok(remote),
            Err(e) => {
                warn!("Remote load of matches failed: {}", e);
                Ok(local)
            }
        }
    }

    fn save_matches(&self, matches: &[SavedMatch]) -> Result<SaveOutcome, StoreError> {
        self.local.save_matches(matches)?;
        Ok(self.mirror("matches", self.remote.save_matches(matches)))
    }

    fn load_settings(&self) -> Result<Option<BankSettings>, StoreError> {
        if let Some(settings) = self.local.load_settings()? {
            return Ok(Some(settings));
        }

        match self.remote.load_settings() {
            Ok(remote) => Ok(remote),
            Err(e) => {
                warn!("Remote load of bank settings failed: {}", e);
                Ok(None)
            }
        }
    }

    fn save_settings(&self, settings: &BankSettings) -> Result<SaveOutcome, StoreError> {
        self.local.save_settings(settings)?;
        Ok(self.mirror("bank settings", self.remote.save_settings(settings)))
    }
}

/// Store wrapper that serves loads from a TTL cache
///
/// Every save invalidates the cached value it touches. A save holds that
/// value's cache lock until the wrapped store has finished writing.
#[derive(Debug)]
pub struct CachedStore<S, C: Clock> {
    inner: S,
    matches: Mutex<TtlCache<Vec<SavedMatch>, C>>,
    settings: Mutex<TtlCache<Option<BankSettings>, C>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic while holding the lock leaves only a stale cache behind
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<S: Store, C: Clock + Clone> CachedStore<S, C> {
    pub fn new(inner: S, ttl_ms: i64, clock: C) -> Self {
        Self {
            inner,
            matches: Mutex::new(TtlCache::new(ttl_ms, clock.clone())),
            settings: Mutex::new(TtlCache::new(ttl_ms, clock)),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: Store, C: Clock> Store for CachedStore<S, C> {
    fn load_matches(&self) -> Result<Vec<SavedMatch>, StoreError> {
        let mut cache = lock(&self.matches);
        if let Some(matches) = cache.get() {
            debug!("Matches served from cache");
            return Ok(matches);
        }

        let matches = self.inner.load_matches()?;
        cache.insert(matches.clone());
        Ok(matches)
    }

    fn save_matches(&self, matches: &[SavedMatch]) -> Result<SaveOutcome, StoreError> {
        // Held across the write so no load can cache the old records meanwhile
        let mut cache = lock(&self.matches);
        let outcome = self.inner.save_matches(matches);
        cache.invalidate();
        outcome
    }

    fn load_settings(&self) -> Result<Option<BankSettings>, StoreError> {
        let mut cache = lock(&self.settings);
        if let Some(settings) = cache.get() {
            debug!("Bank settings served from cache");
            return Ok(settings);
        }

        let settings = self.inner.load_settings()?;
        cache.insert(settings.clone());
        Ok(settings)
    }

    fn save_settings(&self, settings: &BankSettings) -> Result<SaveOutcome, StoreError> {
        let mut cache = lock(&self.settings);
        let outcome = self.inner.save_settings(settings);
        cache.invalidate();
        outcome
    }
}
