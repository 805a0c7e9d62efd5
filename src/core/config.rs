//! Runtime settings and host-supplied knobs.
//!
//! [`Settings`] is persisted as JSON in the platform config directory and holds
//! everything the poller needs at run time: the git binary, the fetch cadence
//! and the icon glyphs used by the renderer. Hosts override any subset of it on
//! every render request through [`HostKnobs`].

use crate::core::dirs::get_settings_file;
use crate::core::error::{Result, StatusError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides the configured git binary
pub const GIT_BINARY_ENV: &str = "GIT_GLANCE_GIT";

/// Environment variable whose log filter takes precedence over settings and knobs
pub const LOG_ENV: &str = "RUST_LOG";

const DEFAULT_FETCH_INTERVAL_SECS: u64 = 300;

/// Raise or lower the global log ceiling, unless [`LOG_ENV`] is set.
///
/// Returns whether the level was applied.
pub fn apply_log_level(level: log::LevelFilter) -> bool {
    if std::env::var_os(LOG_ENV).is_some() {
        return false;
    }
    log::set_max_level(level);
    true
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Icons {
    pub fetching: String,
    pub status_other: String,
    pub status_dirty: String,
    pub status_push_or_pull: String,
    pub status_clean: String,
    pub push_count: String,
    pub pull_count: String,
    pub modified_count: String,
    pub untracked_count: String,
    pub deleted_count: String,
    pub staged_count: String,
    pub stashes_count: String,
    pub separator: String,
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            fetching: "\u{231A}".to_string(),
            status_other: "\u{203C}\u{FE0F}".to_string(),
            status_dirty: "\u{1F534}".to_string(),
            status_push_or_pull: "\u{1F7E1}".to_string(),
            status_clean: "\u{1F7E2}".to_string(),
            push_count: "\u{2B06}".to_string(),
            pull_count: "\u{2B07}".to_string(),
            modified_count: "\u{270E}".to_string(),
            untracked_count: "\u{26A0}".to_string(),
            deleted_count: "\u{2212}".to_string(),
            staged_count: "\u{2713}".to_string(),
            stashes_count: "\u{2BB9}".to_string(),
            separator: " \u{23B8} ".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub debug: bool,
    pub git_binary: PathBuf,
    pub auto_fetch: bool,
    pub fetch_interval_secs: u64,
    pub icons: Icons,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            git_binary: PathBuf::from("git"),
            auto_fetch: true,
            fetch_interval_secs: DEFAULT_FETCH_INTERVAL_SECS,
            icons: Icons::default(),
        }
    }
}

/// Options a host passes along with every render request.
///
/// Every field is optional; only the ones present replace the running
/// settings. Keys follow the flat naming hosts use for their knob tables.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct HostKnobs {
    pub debug: Option<bool>,
    pub git_binary: Option<PathBuf>,
    pub auto_fetch: Option<bool>,
    pub fetch_interval_secs: Option<u64>,
    pub icon_fetching: Option<String>,
    pub icon_status_other: Option<String>,
    pub icon_status_dirty: Option<String>,
    pub icon_status_push_or_pull: Option<String>,
    pub icon_status_clean: Option<String>,
    pub icon_push_count: Option<String>,
    pub icon_pull_count: Option<String>,
    pub icon_modified_count: Option<String>,
    pub icon_untracked_count: Option<String>,
    pub icon_deleted_count: Option<String>,
    pub icon_staged_count: Option<String>,
    pub icon_stashes_count: Option<String>,
    pub separator: Option<String>,
}

fn replace<T: PartialEq + Clone>(slot: &mut T, value: &Option<T>) -> bool {
    match value {
        Some(value) if slot != value => {
            *slot = value.clone();
            true
        }
        _ => false,
    }
}

impl Settings {
    /// Load settings from the config directory, falling back to defaults
    /// when no file has been written yet.
    pub fn load_or_default() -> Result<Self> {
        let path = get_settings_file()?;
        let mut settings = if path.exists() {
            Self::load_from(&path)?
        } else {
            log::debug!("No settings file at {}, using defaults", path.display());
            Self::default()
        };
        settings.apply_env();
        Ok(settings)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| StatusError::settings_read_failed(path, e))?;
        serde_json::from_str(&content).map_err(|e| StatusError::settings_parse_failed(path, e))
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = get_settings_file()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply `GIT_GLANCE_GIT` if it is set and non-empty
    pub fn apply_env(&mut self) {
        if let Some(binary) = std::env::var_os(GIT_BINARY_ENV).filter(|v| !v.is_empty()) {
            self.git_binary = PathBuf::from(binary);
        }
    }

    /// Merge the knobs that are present. Returns `true` if anything changed.
    pub fn apply_knobs(&mut self, knobs: &HostKnobs) -> bool {
        let icons = &mut self.icons;
        let changed = [
            replace(&mut self.debug, &knobs.debug),
            replace(&mut self.git_binary, &knobs.git_binary),
            replace(&mut self.auto_fetch, &knobs.auto_fetch),
            replace(&mut self.fetch_interval_secs, &knobs.fetch_interval_secs),
            replace(&mut icons.fetching, &knobs.icon_fetching),
            replace(&mut icons.status_other, &knobs.icon_status_other),
            replace(&mut icons.status_dirty, &knobs.icon_status_dirty),
            replace(&mut icons.status_push_or_pull, &knobs.icon_status_push_or_pull),
            replace(&mut icons.status_clean, &knobs.icon_status_clean),
            replace(&mut icons.push_count, &knobs.icon_push_count),
            replace(&mut icons.pull_count, &knobs.icon_pull_count),
            replace(&mut icons.modified_count, &knobs.icon_modified_count),
            replace(&mut icons.untracked_count, &knobs.icon_untracked_count),
            replace(&mut icons.deleted_count, &knobs.icon_deleted_count),
            replace(&mut icons.staged_count, &knobs.icon_staged_count),
            replace(&mut icons.stashes_count, &knobs.icon_stashes_count),
            replace(&mut icons.separator, &knobs.separator),
        ];
        changed.iter().any(|c| *c)
    }

    pub fn fetch_interval(&self) -> Duration {
        Duration::from_secs(self.fetch_interval_secs)
    }

    pub fn log_level(&self) -> log::LevelFilter {
        if self.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.git_binary, PathBuf::from("git"));
        assert_eq!(settings.fetch_interval(), Duration::from_secs(300));
        assert!(settings.auto_fetch);
        assert_eq!(settings.icons.status_clean, "🟢");
        assert_eq!(settings.icons.separator, " ⎸ ");
    }

    #[test]
    fn test_apply_knobs_only_touches_present_fields() {
        let mut settings = Settings::default();
        let knobs = HostKnobs {
            git_binary: Some(PathBuf::from("/opt/git/bin/git")),
            icon_status_clean: Some("ok".to_string()),
            ..Default::default()
        };

        assert!(settings.apply_knobs(&knobs));
        assert_eq!(settings.git_binary, PathBuf::from("/opt/git/bin/git"));
        assert_eq!(settings.icons.status_clean, "ok");
        assert_eq!(settings.icons.status_dirty, Icons::default().status_dirty);

        // Same knobs again are a no-op
        assert!(!settings.apply_knobs(&knobs));
    }

    #[test]
    fn test_knobs_deserialize_from_flat_keys() -> anyhow::Result<()> {
        let knobs: HostKnobs =
            serde_json::from_str(r#"{"debug": true, "icon_push_count": "^"}"#)?;
        assert_eq!(knobs.debug, Some(true));
        assert_eq!(knobs.icon_push_count.as_deref(), Some("^"));
        assert_eq!(knobs.git_binary, None);
        Ok(())
    }

    #[test]
    fn test_save_and_load() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("nested").join("config.json");

        let settings = Settings {
            fetch_interval_secs: 42,
            ..Default::default()
        };
        settings.save_to(&path)?;

        assert_eq!(Settings::load_from(&path)?, settings);
        Ok(())
    }

    #[test]
    fn test_partial_file_fills_defaults() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{"auto_fetch": false}"#)?;

        let settings = Settings::load_from(&path)?;
        assert!(!settings.auto_fetch);
        assert_eq!(settings.icons, Icons::default());
        Ok(())
    }

    #[test]
    fn test_load_invalid_file() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "{ invalid json")?;

        match Settings::load_from(&path) {
            Err(StatusError::SettingsParseFailed { path: failed, .. }) => {
                assert_eq!(failed, path)
            }
            other => panic!("Expected SettingsParseFailed, got: {:?}", other),
        }
        Ok(())
    }
}
