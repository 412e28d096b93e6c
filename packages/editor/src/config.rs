use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::EditorError;

pub const DEFAULT_CONFIG_NAME: &str = "funnel.config.json";

/// Editor configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Maximum number of history snapshots kept for undo
    pub history_limit: usize,

    /// Periodic auto-save interval
    pub autosave_interval_secs: u64,

    /// Quiet period after the last edit before an auto-save
    pub idle_debounce_ms: u64,

    /// Lifetime of a rejected-edit notice
    pub notice_timeout_ms: u64,

    /// Optional prefix for generated ids
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_prefix: Option<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: 50,
            autosave_interval_secs: 30,
            idle_debounce_ms: 2000,
            notice_timeout_ms: 3000,
            id_prefix: None,
        }
    }
}

impl EditorConfig {
    /// Load config from a directory, falling back to defaults when absent
    pub fn load(cwd: impl AsRef<Path>) -> Result<Self, EditorError> {
        let config_path = Self::path_in(cwd);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: EditorConfig = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(EditorConfig::default())
        }
    }

    pub fn path_in(cwd: impl AsRef<Path>) -> PathBuf {
        cwd.as_ref().join(DEFAULT_CONFIG_NAME)
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs.max(1))
    }

    pub fn idle_debounce(&self) -> Duration {
        Duration::from_millis(self.idle_debounce_ms)
    }

    pub fn notice_timeout(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.notice_timeout_ms.min(i64::MAX as u64) as i64)
    }
}
