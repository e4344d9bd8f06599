//! Configuration for Blockfall.
//!
//! Raw TOML structs (every field optional) are resolved into validated
//! [`Settings`] at the parse boundary. A missing file means defaults.
//!
//! ```toml
//! [board]
//! columns = 5
//! rows = 7
//!
//! [layout]
//! cell_size = 64.0
//! column_margin = 4.0
//!
//! [animation]
//! duration_ms = 150
//! completion = "latch"        # or "debounce"
//! debounce_window_ms = 100
//! snapshot_throttle_ms = 20
//! reduced_motion = false
//!
//! [storage]
//! scores_path = "/tmp/scores.json"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs, io};

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_COLUMNS: usize = 5;
pub const DEFAULT_ROWS: usize = 7;
pub const DEFAULT_CELL_SIZE: f32 = 64.0;
pub const DEFAULT_COLUMN_MARGIN: f32 = 4.0;
pub const DEFAULT_ANIMATION: Duration = Duration::from_millis(150);
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(100);
pub const DEFAULT_SNAPSHOT_THROTTLE: Duration = Duration::from_millis(20);

/// Columns are addressed with the digit keys, so at most nine.
const MAX_COLUMNS: usize = 9;
const MAX_ROWS: usize = 32;

const COMPLETION_ENV: &str = "BLOCKFALL_COMPLETION";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Default, Deserialize)]
pub struct BlockfallConfig {
    pub board: Option<BoardConfig>,
    pub layout: Option<LayoutConfig>,
    pub animation: Option<AnimationConfig>,
    pub storage: Option<StorageConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BoardConfig {
    pub columns: Option<usize>,
    pub rows: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LayoutConfig {
    pub cell_size: Option<f32>,
    pub column_margin: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnimationConfig {
    pub duration_ms: Option<u64>,
    pub completion: Option<CompletionMode>,
    pub debounce_window_ms: Option<u64>,
    pub snapshot_throttle_ms: Option<u64>,
    /// Collapse every motion to zero length.
    #[serde(default)]
    pub reduced_motion: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct StorageConfig {
    pub scores_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CompletionMode {
    #[default]
    Latch,
    Debounce,
}

impl CompletionMode {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "latch" => Some(Self::Latch),
            "debounce" => Some(Self::Debounce),
            _ => None,
        }
    }
}

/// How a phase decides that every entity finished its motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStrategy {
    /// Count down from the number of motions the phase started.
    Latch,
    /// Fire once no completion arrived for `window`.
    Debounce { window: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardSettings {
    pub columns: usize,
    pub rows: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutSettings {
    pub cell_size: f32,
    pub column_margin: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationSettings {
    pub duration: Duration,
    pub completion: CompletionStrategy,
    pub snapshot_throttle: Duration,
}

/// Fully validated configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub board: BoardSettings,
    pub layout: LayoutSettings,
    pub animation: AnimationSettings,
    pub scores_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            board: BoardSettings {
                columns: DEFAULT_COLUMNS,
                rows: DEFAULT_ROWS,
            },
            layout: LayoutSettings {
                cell_size: DEFAULT_CELL_SIZE,
                column_margin: DEFAULT_COLUMN_MARGIN,
            },
            animation: AnimationSettings {
                duration: DEFAULT_ANIMATION,
                completion: CompletionStrategy::Latch,
                snapshot_throttle: DEFAULT_SNAPSHOT_THROTTLE,
            },
            scores_path: None,
        }
    }
}

impl BlockfallConfig {
    /// Load `~/.blockfall/config.toml`. `Ok(None)` when there is no file.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(config),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    /// Validate and fill defaults. `completion_override` wins over the file.
    pub fn resolve(
        &self,
        completion_override: Option<CompletionMode>,
    ) -> Result<Settings, ConfigError> {
        let board = self.board.as_ref();
        let columns = board.and_then(|b| b.columns).unwrap_or(DEFAULT_COLUMNS);
        if columns == 0 || columns > MAX_COLUMNS {
            return Err(ConfigError::Invalid {
                field: "board.columns",
                reason: format!("{columns} is not in 1..={MAX_COLUMNS}"),
            });
        }
        let rows = board.and_then(|b| b.rows).unwrap_or(DEFAULT_ROWS);
        if rows == 0 || rows > MAX_ROWS {
            return Err(ConfigError::Invalid {
                field: "board.rows",
                reason: format!("{rows} is not in 1..={MAX_ROWS}"),
            });
        }

        let layout = self.layout.as_ref();
        let cell_size = layout.and_then(|l| l.cell_size).unwrap_or(DEFAULT_CELL_SIZE);
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "layout.cell_size",
                reason: format!("{cell_size} must be a positive number"),
            });
        }
        let column_margin = layout
            .and_then(|l| l.column_margin)
            .unwrap_or(DEFAULT_COLUMN_MARGIN);
        if !column_margin.is_finite() || column_margin < 0.0 {
            return Err(ConfigError::Invalid {
                field: "layout.column_margin",
                reason: format!("{column_margin} must not be negative"),
            });
        }

        let animation = self.animation.as_ref();
        let reduced_motion = animation.is_some_and(|a| a.reduced_motion);
        let duration = if reduced_motion {
            Duration::ZERO
        } else {
            animation
                .and_then(|a| a.duration_ms)
                .map_or(DEFAULT_ANIMATION, Duration::from_millis)
        };
        let mode = completion_override
            .or_else(|| animation.and_then(|a| a.completion))
            .unwrap_or_default();
        let completion = match mode {
            CompletionMode::Latch => CompletionStrategy::Latch,
            CompletionMode::Debounce => {
                let window = animation
                    .and_then(|a| a.debounce_window_ms)
                    .map_or(DEFAULT_DEBOUNCE_WINDOW, Duration::from_millis);
                if window.is_zero() {
                    return Err(ConfigError::Invalid {
                        field: "animation.debounce_window_ms",
                        reason: "the debounce window must be longer than zero".to_string(),
                    });
                }
                CompletionStrategy::Debounce { window }
            }
        };
        let snapshot_throttle = animation
            .and_then(|a| a.snapshot_throttle_ms)
            .map_or(DEFAULT_SNAPSHOT_THROTTLE, Duration::from_millis);

        Ok(Settings {
            board: BoardSettings { columns, rows },
            layout: LayoutSettings {
                cell_size,
                column_margin,
            },
            animation: AnimationSettings {
                duration,
                completion,
                snapshot_throttle,
            },
            scores_path: self.storage.as_ref().and_then(|s| s.scores_path.clone()),
        })
    }
}

/// `BLOCKFALL_COMPLETION=latch|debounce`, if set to a known value.
#[must_use]
pub fn completion_from_env() -> Option<CompletionMode> {
    let raw = env::var(COMPLETION_ENV).ok()?;
    let mode = CompletionMode::parse(&raw);
    if mode.is_none() {
        tracing::warn!("Unknown {COMPLETION_ENV} value: {raw}");
    }
    mode
}

#[must_use]
pub fn data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".blockfall"))
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("config.toml"))
}
