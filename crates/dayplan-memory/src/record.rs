//! Persisted record shapes.

use chrono::{DateTime, FixedOffset, Utc};
use dayplan_core::{Category, Priority, Task};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, VecDeque};

/// Max completed-task records kept. Oldest are evicted first.
pub const MAX_HISTORY: usize = 1000;

/// The whole memory file.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MemoryRecord {
    #[serde(default)]
    pub user_preferences: BTreeMap<String, PreferenceEntry>,
    #[serde(default)]
    pub task_history: VecDeque<TaskRecord>,
    #[serde(default)]
    pub learned_patterns: BTreeMap<String, LearnedPattern>,
    #[serde(default)]
    pub metadata: Metadata,
    /// Keys written by newer versions; carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MemoryRecord {
    /// Append a completion, evicting the oldest record past the cap.
    pub fn push_history(&mut self, record: TaskRecord) {
        self.task_history.push_back(record);
        while self.task_history.len() > MAX_HISTORY {
            self.task_history.pop_front();
        }
    }

    pub fn touch(&mut self) {
        self.metadata.last_updated = Utc::now();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreferenceEntry {
    pub value: Value,
    pub updated_at: DateTime<Utc>,
}

/// One completed task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskRecord {
    #[serde(default)]
    pub task_id: Option<String>,
    pub task_name: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub estimated_duration: Option<u32>,
    #[serde(default)]
    pub actual_duration: Option<u32>,
    /// Local wall-clock time with offset; the hour drives peak-hour analysis.
    pub completed_at: DateTime<FixedOffset>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_success() -> bool { true }

impl TaskRecord {
    pub fn from_task(
        task: &Task,
        completed_at: DateTime<FixedOffset>,
        actual: Option<u32>,
    ) -> Self {
        Self {
            task_id: task.id.clone(),
            task_name: task.name.clone(),
            category: task.category.clone(),
            estimated_duration: Some(task.estimated_duration),
            actual_duration: actual.or(task.actual_duration),
            completed_at,
            priority: task.priority,
            success: true,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LearnedPattern {
    pub data: Value,
    pub learned_at: DateTime<Utc>,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Metadata {
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_version() -> String { "1.0".into() }

impl Default for Metadata {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            last_updated: now,
            version: default_version(),
            extra: Map::new(),
        }
    }
}
