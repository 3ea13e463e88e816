//! File-based preference/pattern store.
//! Loaded once, written through on every mutation. The writer lock is held
//! across modify + persist, and the in-memory copy only changes after the
//! file write succeeds.

use chrono::{DateTime, FixedOffset, Utc};
use dayplan_core::types::{MAX_WORK_HOURS_KEY, MORNING_CATEGORIES_KEY};
use dayplan_core::{DayPlanConfig, DayPlanError, Preferences, Result, Task};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::analysis::{HistoryAnalysis, analyze_task_history};
use crate::record::{LearnedPattern, MemoryRecord, PreferenceEntry, TaskRecord};

/// Durable store of preferences, completed-task history, and learned patterns.
pub struct PreferenceStore {
    path: PathBuf,
    state: Mutex<MemoryRecord>,
}

impl PreferenceStore {
    /// Open the store at `path`, loading it if the file exists.
    pub fn open(path: &Path) -> Result<Self> {
        let record = read_record(path)?;
        tracing::info!("🧠 Memory store ready at {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            state: Mutex::new(record),
        })
    }

    /// Default store path (~/.dayplan/memory_bank.json).
    pub fn default_path() -> PathBuf {
        DayPlanConfig::home_dir().join("memory_bank.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file, replacing the in-memory copy.
    pub fn reload(&self) -> Result<()> {
        let mut state = self.lock();
        *state = read_record(&self.path)?;
        Ok(())
    }

    /// A copy of the current record.
    pub fn snapshot(&self) -> MemoryRecord {
        self.lock().clone()
    }

    // ─── Preferences ──────────────────────────────────────────

    pub fn store_preference<T: Serialize>(&self, key: &str, value: T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.mutate(|mem| {
            mem.user_preferences.insert(
                key.to_string(),
                PreferenceEntry {
                    value,
                    updated_at: Utc::now(),
                },
            );
        })?;
        tracing::info!("⚙️ Preference stored: {}", key);
        Ok(())
    }

    /// Typed lookup. A stored value of the wrong shape reads as absent.
    pub fn get_preference<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.lock().user_preferences.get(key)?.value.clone();
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("⚠️ Preference '{}' has unexpected shape: {e}", key);
                None
            }
        }
    }

    pub fn get_preference_raw(&self, key: &str) -> Option<Value> {
        self.lock().user_preferences.get(key).map(|e| e.value.clone())
    }

    /// Preferences the pipeline consumes, with defaults for anything unset.
    pub fn preferences(&self) -> Preferences {
        let defaults = Preferences::default();
        Preferences {
            morning_categories: self
                .get_preference(MORNING_CATEGORIES_KEY)
                .unwrap_or(defaults.morning_categories),
            max_work_hours: self
                .get_preference(MAX_WORK_HOURS_KEY)
                .unwrap_or(defaults.max_work_hours),
        }
    }

    // ─── Task history ─────────────────────────────────────────

    pub fn store_task_completion(
        &self,
        task: &Task,
        completed_at: DateTime<FixedOffset>,
        actual_minutes: Option<u32>,
    ) -> Result<()> {
        let record = TaskRecord::from_task(task, completed_at, actual_minutes);
        self.mutate(|mem| mem.push_history(record))?;
        tracing::info!("✅ Completion stored: '{}'", task.name);
        Ok(())
    }

    pub fn task_history(&self) -> Vec<TaskRecord> {
        self.lock().task_history.iter().cloned().collect()
    }

    pub fn analyze_task_history(&self) -> HistoryAnalysis {
        analyze_task_history(&self.task_history())
    }

    // ─── Learned patterns ─────────────────────────────────────

    /// Store a pattern. Confidence comes from `data.confidence`, default 1.0.
    pub fn learn_pattern(&self, name: &str, data: Value) -> Result<()> {
        let confidence = data
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or(1.0);
        self.mutate(|mem| {
            mem.learned_patterns.insert(
                name.to_string(),
                LearnedPattern {
                    data,
                    learned_at: Utc::now(),
                    confidence,
                },
            );
        })?;
        tracing::info!("💡 Pattern learned: {} (confidence {:.2})", name, confidence);
        Ok(())
    }

    pub fn get_pattern(&self, name: &str) -> Option<Value> {
        self.lock().learned_patterns.get(name).map(|p| p.data.clone())
    }

    /// Tips derived from history, preferences, and learned patterns.
    pub fn personalized_recommendations(&self) -> Vec<String> {
        let mut tips = Vec::new();

        if let Some(hour) = self.analyze_task_history().most_productive_hour {
            tips.push(format!(
                "You're most productive around {hour}:00. Schedule important tasks during this time."
            ));
        }
        if self.get_preference_raw("break_frequency").is_some() {
            tips.push("Don't forget to take regular breaks as per your preferences.".into());
        }
        let overestimates = self
            .get_pattern("estimation_tendency")
            .and_then(|d| d.get("tendency").and_then(Value::as_str).map(str::to_string))
            .is_some_and(|t| t == "overestimates");
        if overestimates {
            tips.push(
                "You tend to overestimate task duration. Try reducing estimates by 20%.".into(),
            );
        }

        tips
    }

    /// Wipe everything and persist the empty record.
    pub fn clear(&self) -> Result<()> {
        let mut state = self.lock();
        let fresh = MemoryRecord::default();
        write_record(&self.path, &fresh)?;
        *state = fresh;
        tracing::warn!("🗑️ Memory cleared");
        Ok(())
    }

    /// Apply `f` to a copy, persist it, then commit. Holds the writer lock throughout.
    fn mutate<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut MemoryRecord),
    {
        let mut state = self.lock();
        let mut next = state.clone();
        f(&mut next);
        next.touch();
        write_record(&self.path, &next)?;
        *state = next;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, MemoryRecord> {
        // Commits happen only after a successful write, so a poisoned
        // record is still consistent.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn read_record(path: &Path) -> Result<MemoryRecord> {
    if !path.exists() {
        tracing::info!("📭 No existing memory at {}", path.display());
        return Ok(MemoryRecord::default());
    }
    let json = std::fs::read_to_string(path)
        .map_err(|e| DayPlanError::Store(format!("Read {}: {e}", path.display())))?;
    let record = serde_json::from_str(&json)
        .map_err(|e| DayPlanError::Store(format!("Parse {}: {e}", path.display())))?;
    tracing::debug!("📂 Memory loaded from {}", path.display());
    Ok(record)
}

fn write_record(path: &Path, record: &MemoryRecord) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(record)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json)
        .map_err(|e| DayPlanError::Store(format!("Write {}: {e}", tmp.display())))?;
    std::fs::rename(&tmp, path)
        .map_err(|e| DayPlanError::Store(format!("Rename to {}: {e}", path.display())))?;
    tracing::debug!("💾 Memory saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use dayplan_core::{Category, Priority};
    use std::sync::Arc;

    fn at(hour: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 10, hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::open(&dir.path().join("memory.json")).unwrap();
        assert!(store.task_history().is_empty());
        assert_eq!(store.preferences(), Preferences::default());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_write_through_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");
        {
            let store = PreferenceStore::open(&path).unwrap();
            store.store_preference(MORNING_CATEGORIES_KEY, vec!["coding"]).unwrap();
            store.store_preference(MAX_WORK_HOURS_KEY, 6.5).unwrap();
            let task = Task::new("Ship it")
                .with_category(Category::Coding)
                .with_priority(Priority::High);
            store.store_task_completion(&task, at(11), Some(75)).unwrap();
            store
                .learn_pattern(
                    "peak_productivity_hours",
                    serde_json::json!({"hours": [11], "confidence": 0.4}),
                )
                .unwrap();
        }

        let store = PreferenceStore::open(&path).unwrap();
        let prefs = store.preferences();
        assert_eq!(prefs.morning_categories, vec!["coding".to_string()]);
        assert_eq!(prefs.max_work_hours, 6.5);
        let history = store.task_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].actual_duration, Some(75));
        assert_eq!(history[0].priority, Priority::High);
        assert_eq!(store.get_pattern("peak_productivity_hours").unwrap()["hours"][0], 11);
        assert_eq!(store.snapshot().learned_patterns["peak_productivity_hours"].confidence, 0.4);
    }

    #[test]
    fn test_repeated_load_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");
        let store = PreferenceStore::open(&path).unwrap();
        store.store_preference("break_frequency", 90).unwrap();
        let before = store.snapshot();
        store.reload().unwrap();
        store.reload().unwrap();
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_unknown_keys_survive_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");
        std::fs::write(
            &path,
            r#"{
                "user_preferences": {},
                "task_history": [],
                "learned_patterns": {},
                "calendar_sync": {"token": "abc"}
            }"#,
        )
        .unwrap();
        let store = PreferenceStore::open(&path).unwrap();
        store.store_preference("theme", "dark").unwrap();

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["calendar_sync"]["token"], "abc");
        assert_eq!(raw["user_preferences"]["theme"]["value"], "dark");
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(PreferenceStore::open(&path), Err(DayPlanError::Store(_))));
    }

    #[test]
    fn test_wrong_shape_preference_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::open(&dir.path().join("m.json")).unwrap();
        store.store_preference(MAX_WORK_HOURS_KEY, "lots").unwrap();
        assert_eq!(store.preferences().max_work_hours, 8.0);
    }

    #[test]
    fn test_concurrent_writers_do_not_lose_updates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");
        let store = Arc::new(PreferenceStore::open(&path).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..10 {
                        let task = Task::new(&format!("w{worker}-{i}"));
                        store.store_task_completion(&task, at(9), Some(30)).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(store.task_history().len(), 40);
        let reopened = PreferenceStore::open(&path).unwrap();
        assert_eq!(reopened.task_history().len(), 40);
    }

    #[test]
    fn test_recommendations_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::open(&dir.path().join("m.json")).unwrap();
        assert!(store.personalized_recommendations().is_empty());

        store.store_task_completion(&Task::new("a"), at(14), Some(20)).unwrap();
        store.store_preference("break_frequency", 60).unwrap();
        store
            .learn_pattern("estimation_tendency", serde_json::json!({"tendency": "overestimates"}))
            .unwrap();
        let tips = store.personalized_recommendations();
        assert_eq!(tips.len(), 3);
        assert!(tips[0].contains("14:00"));

        store.clear().unwrap();
        assert!(store.task_history().is_empty());
        assert!(store.get_pattern("estimation_tendency").is_none());
    }
}
