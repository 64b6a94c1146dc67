//! Settings - rebind と設定解決のチューニング値
//!
//! JSON から読み込めます。省略したフィールドはデフォルト値になります。

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What a batch does when one object fails fatally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Abort the remaining objects of the batch at the first failure.
    FailFast,
    /// Restore everything that can be restored, then report an error.
    #[default]
    FailAtEnd,
    /// Record failures in the report and succeed.
    Continue,
}

/// The two timeout budgets of `ConfigStore::get_non_blocking`.
///
/// - `quick_wait`: a structured key is resolved as fresh work on the
///   execution context; this is how long the caller waits for it.
/// - `settle_wait`: a simple key holding a pending value only gets this long,
///   enough for nearly finished computations to land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveTimeouts {
    pub quick_wait_ms: u64,
    pub settle_wait_ms: u64,
}

impl ResolveTimeouts {
    pub fn new(quick_wait: Duration, settle_wait: Duration) -> Self {
        Self {
            quick_wait_ms: quick_wait.as_millis() as u64,
            settle_wait_ms: settle_wait.as_millis() as u64,
        }
    }

    pub fn quick_wait(&self) -> Duration {
        Duration::from_millis(self.quick_wait_ms)
    }

    pub fn settle_wait(&self) -> Duration {
        Duration::from_millis(self.settle_wait_ms)
    }
}

impl Default for ResolveTimeouts {
    fn default() -> Self {
        Self {
            quick_wait_ms: 200,
            settle_wait_ms: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RebindConfig {
    pub failure_mode: FailureMode,
    pub timeouts: ResolveTimeouts,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("cannot read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
}

impl RebindConfig {
    pub fn from_json_str(s: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}
