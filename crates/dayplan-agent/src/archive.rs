//! Plan archive: per-session output files.
//! JSON for the structured pieces, plain text for the human summary.
//!
//! ```text
//! outputs/
//!   plan_<session>.json       full bundle
//!   schedule_<session>.json   blocks only
//!   reminders_<session>.json
//!   summary_<session>.txt
//! ```

use dayplan_core::{DayPlanError, Result};
use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::orchestrator::{PlanBundle, is_valid_session_id};

pub struct PlanArchive {
    dir: PathBuf,
}

impl PlanArchive {
    pub fn new(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn plan_path(&self, session_id: &str) -> Result<PathBuf> {
        self.session_file("plan", session_id, "json")
    }

    /// `<prefix>_<session>.<ext>` inside the archive. Ids that could escape it are rejected.
    fn session_file(&self, prefix: &str, session_id: &str, ext: &str) -> Result<PathBuf> {
        if !is_valid_session_id(session_id) {
            return Err(DayPlanError::Input(format!("Invalid session id '{session_id}'")));
        }
        Ok(self.dir.join(format!("{prefix}_{session_id}.{ext}")))
    }

    /// Write every file for the bundle's session. Returns the paths written.
    pub fn save(&self, bundle: &PlanBundle) -> Result<Vec<PathBuf>> {
        let id = &bundle.session_id;
        let files = [
            (self.plan_path(id)?, serde_json::to_string_pretty(bundle)?),
            (
                self.session_file("schedule", id, "json")?,
                serde_json::to_string_pretty(&bundle.schedule)?,
            ),
            (
                self.session_file("reminders", id, "json")?,
                serde_json::to_string_pretty(&bundle.reminders)?,
            ),
            (self.session_file("summary", id, "txt")?, summary_text(bundle)),
        ];

        let mut written = Vec::with_capacity(files.len());
        for (path, body) in files {
            std::fs::write(&path, body)?;
            written.push(path);
        }
        tracing::info!("💾 Archived session {} to {}", id, self.dir.display());
        Ok(written)
    }

    pub fn load(&self, session_id: &str) -> Result<PlanBundle> {
        let path = self.plan_path(session_id)?;
        let content = std::fs::read_to_string(&path).map_err(|e| {
            DayPlanError::Input(format!("No saved plan for session '{session_id}' ({e})"))
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Archived session ids, oldest first by name.
    pub fn sessions(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().to_string();
                name.strip_prefix("plan_")
                    .and_then(|rest| rest.strip_suffix(".json"))
                    .filter(|id| is_valid_session_id(id))
                    .map(str::to_string)
            })
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// Most recently saved bundle, by file modification time.
    pub fn latest(&self) -> Result<Option<PlanBundle>> {
        let mut newest: Option<(std::time::SystemTime, String)> = None;
        for id in self.sessions()? {
            let modified = std::fs::metadata(self.plan_path(&id)?)?.modified()?;
            let is_newer = newest.as_ref().is_none_or(|(t, _)| modified >= *t);
            if is_newer {
                newest = Some((modified, id));
            }
        }
        match newest {
            Some((_, id)) => self.load(&id).map(Some),
            None => Ok(None),
        }
    }
}

/// Schedule text plus the evaluation and reflection verdicts.
pub fn summary_text(bundle: &PlanBundle) -> String {
    let mut out = bundle.formatted_schedule.clone();
    let eval = &bundle.evaluation;
    let _ = writeln!(out);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "📝 Plan Quality: {}/{} (Grade {})",
        eval.total_score, eval.max_score, eval.grade
    );
    for line in &eval.feedback {
        let _ = writeln!(out, "   • {line}");
    }
    for line in &eval.recommendations {
        let _ = writeln!(out, "   → {line}");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "🔁 Reflection: {}", bundle.reflection.replan_reason);
    for line in &bundle.reflection.recommendations {
        let _ = writeln!(out, "   → {line}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::Pipeline;
    use chrono::{FixedOffset, TimeZone};
    use dayplan_core::{DayPlanConfig, Task};
    use dayplan_memory::PreferenceStore;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn bundle(dir: &TempDir, session: &str) -> PlanBundle {
        let store = PreferenceStore::open(&dir.path().join("memory.json")).unwrap();
        let mut p = Pipeline::new(Arc::new(store), DayPlanConfig::default());
        let now = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 10, 8, 0, 0)
            .unwrap();
        p.run_at(vec![Task::new("Write").with_duration(45), Task::new("Read")], Some(session), now)
            .unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let archive = PlanArchive::new(&dir.path().join("outputs")).unwrap();
        let b = bundle(&dir, "s1");

        let written = archive.save(&b).unwrap();
        assert_eq!(written.len(), 4);
        assert!(written.iter().all(|p| p.exists()));

        let loaded = archive.load("s1").unwrap();
        assert_eq!(loaded, b);
        assert_eq!(archive.sessions().unwrap(), vec!["s1".to_string()]);
    }

    #[test]
    fn test_summary_file() {
        let dir = TempDir::new().unwrap();
        let archive = PlanArchive::new(dir.path()).unwrap();
        archive.save(&bundle(&dir, "s2")).unwrap();
        let text = std::fs::read_to_string(dir.path().join("summary_s2.txt")).unwrap();
        assert!(text.contains("YOUR DAILY SCHEDULE"));
        assert!(text.contains("Plan Quality:"));
        assert!(text.contains("Reflection: Low completion rate"));
    }

    #[test]
    fn test_missing_session() {
        let dir = TempDir::new().unwrap();
        let archive = PlanArchive::new(dir.path()).unwrap();
        assert!(matches!(archive.load("nope"), Err(DayPlanError::Input(_))));
        assert!(archive.latest().unwrap().is_none());
    }

    #[test]
    fn test_session_ids_cannot_leave_archive() {
        let dir = TempDir::new().unwrap();
        let archive = PlanArchive::new(&dir.path().join("out")).unwrap();
        let mut b = bundle(&dir, "ok");
        b.session_id = "../escaped".to_string();
        assert!(matches!(archive.save(&b), Err(DayPlanError::Input(_))));
        assert!(archive.sessions().unwrap().is_empty());
        for id in ["../x", "a/b", "a\\b", ""] {
            assert!(matches!(archive.load(id), Err(DayPlanError::Input(_))));
        }
    }

    #[test]
    fn test_latest() {
        let dir = TempDir::new().unwrap();
        let archive = PlanArchive::new(&dir.path().join("out")).unwrap();
        archive.save(&bundle(&dir, "only")).unwrap();
        assert_eq!(archive.latest().unwrap().unwrap().session_id, "only");
    }
}
