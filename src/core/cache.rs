//! Single-slot rate cache backed by a flat JSON file.
//!
//! The cache is an optimization layer over the upstream rate API, never a
//! correctness dependency: a missing, corrupt, or stale entry is simply
//! absent, and a failed write never fails the fetch that produced the value.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};
use tracing::{debug, warn};

/// Maximum age before a cached rate is treated as absent.
pub const FRESHNESS_WINDOW_MINUTES: i64 = 15;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedRate {
    pub rate: f64,
    pub timestamp: DateTime<Utc>,
    pub source: String,
}

pub struct RateCache {
    path: PathBuf,
    max_age: Duration,
}

impl RateCache {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        RateCache {
            path: path.as_ref().to_path_buf(),
            max_age: Duration::minutes(FRESHNESS_WINDOW_MINUTES),
        }
    }

    pub fn default_cache_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "ratewatch", "ratewatch")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().join("rate_cache.json"))
    }

    /// Returns the cached rate if one exists and is still fresh. A corrupt
    /// record is logged and treated as absent.
    pub fn read(&self) -> Option<CachedRate> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => {
                debug!("Cache MISS (no cache file)");
                return None;
            }
        };

        let entry: CachedRate = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Ignoring corrupt rate cache at {}: {e}", self.path.display());
                return None;
            }
        };

        let age = Utc::now() - entry.timestamp;
        if age >= self.max_age {
            debug!("Cache MISS (entry is {} minutes old)", age.num_minutes());
            return None;
        }

        debug!("Cache HIT ({} from {})", entry.rate, entry.source);
        Some(entry)
    }

    /// Overwrites the single cache slot. Failures are logged and swallowed;
    /// the caller already has the rate in hand.
    pub fn write(&self, entry: &CachedRate) {
        if let Err(e) = self.try_write(entry) {
            warn!("Failed to write rate cache at {}: {e}", self.path.display());
        }
    }

    fn try_write(&self, entry: &CachedRate) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string_pretty(entry)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, body)?;
        fs::rename(&tmp_path, &self.path)?;
        debug!("Cache PUT ({} from {})", entry.rate, entry.source);
        Ok(())
    }
}
