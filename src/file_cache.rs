//! Persistent per-workspace usage cache.
//!
//! One JSON file per key under the cache directory, named by the hex SHA-256
//! of the key. Several statusline processes may write the directory at once;
//! there is no locking, so a reader can observe a half-written file. Such a
//! file decodes as a miss.
//!
//! Each entry records the TTL it was written with. Staleness on read uses
//! that stored TTL, not the TTL of the reading cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::cache::{UsageCache, is_expired};
use crate::error::UsageError;
use crate::models::UsageSnapshot;
use crate::utils::{format_duration, parse_duration};

/// Files untouched for this long are deleted on the next store
pub const RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// On-disk layout of one cache file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: UsageSnapshot,
    pub stored_at: DateTime<Utc>,
    pub ttl: String,
}

impl CacheEntry {
    /// Staleness against the entry's own TTL; an unreadable TTL counts as expired
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match parse_duration(&self.ttl) {
            Ok(ttl) => is_expired(self.stored_at, ttl, now),
            Err(err) => {
                debug!(ttl = %self.ttl, error = %err, "unreadable stored ttl");
                true
            }
        }
    }
}

pub struct FileCache {
    dir: PathBuf,
    ttl: Duration,
}

impl FileCache {
    /// The directory is created lazily by the first `store`
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    /// `<dir>/<sha256-hex(key)>.json`
    pub fn key_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir.join(format!("{digest:x}.json"))
    }

    fn ensure_dir(&self) -> Result<(), UsageError> {
        create_private_dir(&self.dir).map_err(|e| {
            UsageError::CacheUnavailable(format!("create {}: {e}", self.dir.display()))
        })
    }

    fn write_entry(&self, key: &str, snapshot: &UsageSnapshot) -> Result<(), UsageError> {
        let entry = CacheEntry {
            data: snapshot.clone(),
            stored_at: Utc::now(),
            ttl: format_duration(self.ttl),
        };
        let bytes = serde_json::to_vec(&entry)
            .map_err(|e| UsageError::CacheUnavailable(format!("encode entry: {e}")))?;

        let path = self.key_path(key);
        write_private_file(&path, &bytes).map_err(|e| {
            UsageError::CacheUnavailable(format!("write {}: {e}", path.display()))
        })
    }

    /// `Ok(None)` when no file exists for the key
    fn read_entry(&self, key: &str) -> Result<Option<CacheEntry>, UsageError> {
        let path = self.key_path(key);
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(UsageError::CacheUnavailable(format!(
                    "read {}: {e}",
                    path.display()
                )));
            }
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| UsageError::CacheCorrupt(format!("{}: {e}", path.display())))
    }

    /// Delete regular files in the cache directory older than [`RETENTION`].
    /// Returns how many were removed.
    pub fn cleanup(&self) -> usize {
        let now = SystemTime::now();
        let mut removed = 0;
        for entry in WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(modified) = entry.metadata().ok().and_then(|m| m.modified().ok()) else {
                continue;
            };
            let age = now.duration_since(modified).unwrap_or_default();
            if age > RETENTION {
                match fs::remove_file(entry.path()) {
                    Ok(()) => removed += 1,
                    Err(err) => debug!(path = %entry.path().display(), error = %err, "cleanup skipped file"),
                }
            }
        }
        if removed > 0 {
            debug!(removed, "expired cache files removed");
        }
        removed
    }
}

impl UsageCache for FileCache {
    fn store(&self, key: &str, snapshot: &UsageSnapshot) {
        if let Err(err) = self.ensure_dir() {
            warn!(error = %err, "usage cache unavailable");
            return;
        }
        if let Err(err) = self.write_entry(key, snapshot) {
            warn!(error = %err, "usage cache write failed");
        }
        self.cleanup();
    }

    fn get(&self, key: &str) -> Option<UsageSnapshot> {
        match self.read_entry(key) {
            Ok(Some(entry)) => {
                let expired = entry.is_expired_at(Utc::now());
                let mut data = entry.data;
                data.is_stale = expired;
                Some(data)
            }
            Ok(None) => None,
            Err(err) => {
                debug!(error = %err, "usage cache treated as miss");
                None
            }
        }
    }
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

fn write_private_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(bytes)
}
