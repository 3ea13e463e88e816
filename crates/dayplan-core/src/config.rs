//! DayPlan configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{DayPlanError, Result};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayPlanConfig {
    /// Where the preference/pattern store lives.
    #[serde(default = "default_memory_path")]
    pub memory_path: String,
    /// Directory for per-session plan, schedule, reminder, and summary files.
    #[serde(default = "default_outputs_dir")]
    pub outputs_dir: String,
    #[serde(default)]
    pub workday: WorkdayConfig,
    #[serde(default)]
    pub breaks: BreakConfig,
    #[serde(default)]
    pub input: InputConfig,
}

fn default_memory_path() -> String { "~/.dayplan/memory_bank.json".into() }
fn default_outputs_dir() -> String { "~/.dayplan/outputs".into() }

impl Default for DayPlanConfig {
    fn default() -> Self {
        Self {
            memory_path: default_memory_path(),
            outputs_dir: default_outputs_dir(),
            workday: WorkdayConfig::default(),
            breaks: BreakConfig::default(),
            input: InputConfig::default(),
        }
    }
}

impl DayPlanConfig {
    /// Load config from the default path (~/.dayplan/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DayPlanError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| DayPlanError::Config(format!("Failed to parse config: {e}")))?;
        config.workday.validate()?;
        Ok(config)
    }

    /// Save config to the given path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| DayPlanError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the DayPlan home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".dayplan")
    }

    /// Store path with `~` expanded.
    pub fn memory_path(&self) -> PathBuf {
        expand(&self.memory_path)
    }

    /// Outputs directory with `~` expanded.
    pub fn outputs_dir(&self) -> PathBuf {
        expand(&self.outputs_dir)
    }
}

fn expand(p: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(p).to_string())
}

/// Work-day anchor. Every schedule starts here on the planning date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkdayConfig {
    #[serde(default = "default_start_hour")]
    pub start_hour: u32,
    #[serde(default)]
    pub start_minute: u32,
}

fn default_start_hour() -> u32 { 9 }

impl Default for WorkdayConfig {
    fn default() -> Self {
        Self {
            start_hour: default_start_hour(),
            start_minute: 0,
        }
    }
}

impl WorkdayConfig {
    fn validate(&self) -> Result<()> {
        if self.start_hour > 23 || self.start_minute > 59 {
            return Err(DayPlanError::Config(format!(
                "Invalid workday start {:02}:{:02}",
                self.start_hour, self.start_minute
            )));
        }
        Ok(())
    }
}

/// Break lengths inserted after each task block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakConfig {
    #[serde(default = "default_long_minutes")]
    pub long_minutes: u32,
    #[serde(default = "default_short_minutes")]
    pub short_minutes: u32,
    /// Tasks at least this long get the long break.
    #[serde(default = "default_long_after_minutes")]
    pub long_after_minutes: u32,
}

fn default_long_minutes() -> u32 { 15 }
fn default_short_minutes() -> u32 { 5 }
fn default_long_after_minutes() -> u32 { 60 }

impl Default for BreakConfig {
    fn default() -> Self {
        Self {
            long_minutes: default_long_minutes(),
            short_minutes: default_short_minutes(),
            long_after_minutes: default_long_after_minutes(),
        }
    }
}

impl BreakConfig {
    /// Break length that follows a task of `task_minutes`.
    pub fn after(&self, task_minutes: u32) -> u32 {
        if task_minutes >= self.long_after_minutes {
            self.long_minutes
        } else {
            self.short_minutes
        }
    }
}

/// Input normalization options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InputConfig {
    /// Give tasks without an id a generated one. Off by default: the
    /// reflection loop matches completions by id, and generated ids would
    /// change which tasks count as unfinished.
    #[serde(default)]
    pub assign_missing_ids: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = DayPlanConfig::default();
        assert_eq!(config.workday.start_hour, 9);
        assert_eq!(config.workday.start_minute, 0);
        assert_eq!(config.breaks.long_minutes, 15);
        assert_eq!(config.breaks.short_minutes, 5);
        assert!(!config.input.assign_missing_ids);
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            memory_path = "/tmp/dayplan/memory.json"

            [workday]
            start_hour = 8
            start_minute = 30

            [breaks]
            long_minutes = 20
        "#;

        let config: DayPlanConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.memory_path(), PathBuf::from("/tmp/dayplan/memory.json"));
        assert_eq!(config.workday.start_hour, 8);
        assert_eq!(config.workday.start_minute, 30);
        assert_eq!(config.breaks.long_minutes, 20);
        assert_eq!(config.breaks.short_minutes, 5);
    }

    #[test]
    fn test_config_missing_fields_use_defaults() {
        let config: DayPlanConfig = toml::from_str("").unwrap();
        assert_eq!(config.memory_path, "~/.dayplan/memory_bank.json");
        assert_eq!(config.breaks.long_after_minutes, 60);
    }

    #[test]
    fn test_break_after() {
        let breaks = BreakConfig::default();
        assert_eq!(breaks.after(30), 5);
        assert_eq!(breaks.after(59), 5);
        assert_eq!(breaks.after(60), 15);
        assert_eq!(breaks.after(240), 15);
    }

    #[test]
    fn test_invalid_start_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[workday]\nstart_hour = 25\n").unwrap();
        assert!(matches!(
            DayPlanConfig::load_from(&path),
            Err(DayPlanError::Config(_))
        ));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = DayPlanConfig::default();
        config.workday.start_hour = 7;
        config.save_to(&path).unwrap();
        let loaded = DayPlanConfig::load_from(&path).unwrap();
        assert_eq!(loaded.workday.start_hour, 7);
    }

    #[test]
    fn test_home_dir() {
        let home = DayPlanConfig::home_dir();
        assert!(home.to_string_lossy().contains(".dayplan"));
    }
}
