//! Key/value persistence for scores.
//!
//! The file store keeps a flat JSON object and rewrites it through a temp
//! file + rename so a crash never leaves a half-written score file behind.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

/// Key under which the best score is kept.
pub const BEST_SCORE_KEY: &str = "best_score";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("score store I/O failed at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("score store at {} is not valid JSON: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub trait ScoreStore {
    fn get(&self, key: &str) -> Result<Option<u64>, StoreError>;
    fn set(&mut self, key: &str, value: u64) -> Result<(), StoreError>;
}

/// Store that forgets everything when dropped.
#[derive(Debug, Default, Clone)]
pub struct MemoryScoreStore {
    values: HashMap<String, u64>,
}

impl MemoryScoreStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_value(mut self, key: &str, value: u64) -> Self {
        self.values.insert(key.to_string(), value);
        self
    }
}

impl ScoreStore for MemoryScoreStore {
    fn get(&self, key: &str) -> Result<Option<u64>, StoreError> {
        Ok(self.values.get(key).copied())
    }

    fn set(&mut self, key: &str, value: u64) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// JSON file on disk, e.g. `~/.blockfall/scores.json`.
#[derive(Debug, Clone)]
pub struct FileScoreStore {
    path: PathBuf,
}

impl FileScoreStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<HashMap<String, u64>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if contents.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&contents).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })
    }

    fn write_all(&self, values: &HashMap<String, u64>) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        let json = serde_json::to_vec_pretty(values).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(io_err)?;

        let mut tmp = NamedTempFile::new_in(parent).map_err(io_err)?;
        tmp.write_all(&json).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|err| io_err(err.error))?;
        debug!(path = %self.path.display(), "Persisted scores");
        Ok(())
    }
}

impl ScoreStore for FileScoreStore {
    fn get(&self, key: &str) -> Result<Option<u64>, StoreError> {
        Ok(self.read_all()?.get(key).copied())
    }

    fn set(&mut self, key: &str, value: u64) -> Result<(), StoreError> {
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value);
        self.write_all(&values)
    }
}
