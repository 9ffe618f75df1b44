//! On-disk profile cache: one `<uid>.json` per player holding the last raw
//! payload a provider returned.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::model::Uid;

#[derive(Debug)]
pub enum CacheError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Io { path, source } => {
                write!(f, "profile cache I/O at {}: {}", path.display(), source)
            }
            CacheError::Json { path, source } => {
                write!(f, "corrupt profile cache entry {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Io { source, .. } => Some(source),
            CacheError::Json { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedProfile {
    pub uid: u64,
    pub fetched_at: DateTime<Utc>,
    /// Name of the provider that answered.
    pub source: String,
    pub payload: Value,
}

impl CachedProfile {
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.fetched_at).to_std().unwrap_or(Duration::ZERO)
    }
}

#[derive(Debug, Clone)]
pub struct ProfileCache {
    dir: PathBuf,
    ttl: Duration,
}

impl ProfileCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, uid: Uid) -> PathBuf {
        self.dir.join(format!("{}.json", uid))
    }

    /// Stored entry regardless of age. A missing file is `Ok(None)`.
    pub fn load(&self, uid: Uid) -> Result<Option<CachedProfile>, CacheError> {
        let path = self.path_for(uid);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CacheError::Io { path, source }),
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| CacheError::Json { path, source })
    }

    /// Entry younger than the TTL at `now`, if any.
    pub fn load_fresh_at(
        &self,
        uid: Uid,
        now: DateTime<Utc>,
    ) -> Result<Option<CachedProfile>, CacheError> {
        Ok(self.load(uid)?.filter(|entry| {
            let fresh = entry.age_at(now) < self.ttl;
            if !fresh {
                debug!(uid = %uid, fetched_at = %entry.fetched_at, "Profile cache entry expired");
            }
            fresh
        }))
    }

    pub fn load_fresh(&self, uid: Uid) -> Result<Option<CachedProfile>, CacheError> {
        self.load_fresh_at(uid, Utc::now())
    }

    /// Replace the entry for `entry.uid` atomically.
    pub fn store(&self, entry: &CachedProfile) -> Result<(), CacheError> {
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| CacheError::Io { path, source }
        };
        let path = self.dir.join(format!("{}.json", entry.uid));
        fs::create_dir_all(&self.dir).map_err(io_err(&self.dir))?;
        let contents = serde_json::to_vec(entry).map_err(|source| CacheError::Json {
            path: path.clone(),
            source,
        })?;

        let mut temp_file = NamedTempFile::new_in(&self.dir).map_err(io_err(&self.dir))?;
        temp_file.write_all(&contents).map_err(io_err(&path))?;
        temp_file.as_file_mut().sync_all().map_err(io_err(&path))?;
        temp_file
            .persist(&path)
            .map_err(|err| CacheError::Io {
                path: path.clone(),
                source: err.error,
            })?;
        debug!(uid = entry.uid, path = %path.display(), "Wrote profile cache entry");
        Ok(())
    }

    /// Remove one UID's entry, or every entry when `uid` is `None`.
    /// Returns how many files were deleted.
    pub fn clear(&self, uid: Option<Uid>) -> Result<usize, CacheError> {
        if let Some(uid) = uid {
            let path = self.path_for(uid);
            return match fs::remove_file(&path) {
                Ok(()) => Ok(1),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(0),
                Err(source) => Err(CacheError::Io { path, source }),
            };
        }

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(source) => {
                return Err(CacheError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };
        let mut removed = 0;
        for entry in entries {
            let path = entry
                .map_err(|source| CacheError::Io {
                    path: self.dir.clone(),
                    source,
                })?
                .path();
            let is_entry = path.extension().is_some_and(|ext| ext == "json")
                && path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .is_some_and(|stem| stem.parse::<Uid>().is_ok());
            if is_entry {
                fs::remove_file(&path).map_err(|source| CacheError::Io {
                    path: path.clone(),
                    source,
                })?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
