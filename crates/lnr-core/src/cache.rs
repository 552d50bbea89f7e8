//! Per-profile TTL cache for slow-changing reference data.
//!
//! Layout:
//!   <cache root>/
//!     <profile>/          (0700)
//!       teams.json        {"fetched_at": "...", "payload": ...}
//!       users.json
//!
//! Reads never fail: a missing, unreadable, corrupt or expired entry is a
//! miss. Nothing is invalidated automatically; mutating commands declare the
//! keys they stale (see `invalidation`).

use crate::error::Result;
use crate::io;
use crate::paths;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fetched_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl CacheEntry {
    /// Fresh while `0 <= now - fetched_at <= ttl`. A zero TTL is never
    /// fresh, and neither is an entry stamped in the future.
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        if ttl.is_zero() {
            return false;
        }
        let age = now.signed_duration_since(self.fetched_at);
        if age < chrono::Duration::zero() {
            return false;
        }
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => age <= ttl,
            // Longer than chrono can represent: nothing outlives it.
            Err(_) => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cache {
    root: PathBuf,
}

impl Cache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Cache { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn profile_dir(&self, profile: &str) -> PathBuf {
        paths::profile_cache_dir(&self.root, profile)
    }

    pub fn get<T: DeserializeOwned>(&self, profile: &str, key: &str, ttl: Duration) -> Option<T> {
        self.get_at(profile, key, ttl, Utc::now())
    }

    pub fn get_at<T: DeserializeOwned>(
        &self,
        profile: &str,
        key: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Option<T> {
        if ttl.is_zero() {
            return None;
        }
        let path = self.entry_path(profile, key).ok()?;
        let data = match std::fs::read(&path) {
            Ok(d) => d,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "unreadable cache entry, treating as miss");
                }
                tracing::debug!(profile, key, "cache miss");
                return None;
            }
        };
        let entry: CacheEntry = match serde_json::from_slice(&data) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupt cache entry, treating as miss");
                return None;
            }
        };
        if !entry.is_fresh(ttl, now) {
            tracing::debug!(profile, key, fetched_at = %entry.fetched_at, "cache entry expired");
            return None;
        }
        match serde_json::from_value(entry.payload) {
            Ok(value) => {
                tracing::debug!(profile, key, "cache hit");
                Some(value)
            }
            Err(e) => {
                tracing::warn!(profile, key, error = %e, "cached payload has unexpected shape, treating as miss");
                None
            }
        }
    }

    pub fn set<T: Serialize>(&self, profile: &str, key: &str, value: &T) -> Result<()> {
        self.set_at(profile, key, value, Utc::now())
    }

    pub fn set_at<T: Serialize>(
        &self,
        profile: &str,
        key: &str,
        value: &T,
        fetched_at: DateTime<Utc>,
    ) -> Result<()> {
        let path = self.entry_path(profile, key)?;
        io::ensure_dir_with_mode(&self.profile_dir(profile), io::PRIVATE_DIR_MODE)?;
        let entry = CacheEntry {
            fetched_at,
            payload: serde_json::to_value(value)?,
        };
        let data = serde_json::to_vec(&entry)?;
        io::atomic_write(&path, &data, io::PRIVATE_FILE_MODE)?;
        tracing::debug!(profile, key, "cache stored");
        Ok(())
    }

    /// Remove one entry. Missing entries are fine.
    pub fn invalidate(&self, profile: &str, key: &str) -> Result<()> {
        let path = self.entry_path(profile, key)?;
        if io::remove_if_exists(&path)? {
            tracing::debug!(profile, key, "cache invalidated");
        }
        Ok(())
    }

    /// Remove every entry for `profile`. Other profiles are untouched.
    pub fn clear(&self, profile: &str) -> Result<()> {
        paths::validate_profile_name(profile)?;
        let dir = self.profile_dir(profile);
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => {
                tracing::debug!(profile, "cache cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Cache-first read: return the fresh entry or call `fetch` and store
    /// its result. A failed store is logged, never surfaced.
    pub fn get_or_fetch<T, F>(&self, profile: &str, key: &str, ttl: Duration, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T>,
    {
        if let Some(hit) = self.get(profile, key, ttl) {
            return Ok(hit);
        }
        let value = fetch()?;
        if !ttl.is_zero() {
            if let Err(e) = self.set(profile, key, &value) {
                tracing::warn!(profile, key, error = %e, "failed to write cache entry");
            }
        }
        Ok(value)
    }

    fn entry_path(&self, profile: &str, key: &str) -> Result<PathBuf> {
        paths::validate_profile_name(profile)?;
        paths::validate_cache_key(key)?;
        Ok(paths::cache_entry_path(&self.root, profile, key))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
