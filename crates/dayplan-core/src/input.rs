//! Input normalization: the one place task defaults are applied.
//!
//! Raw input arrives as a JSON list, a `{"tasks": [...]}` object, a single
//! task object, or plain text with one task per line. Plain-text lines may
//! carry a `(priority, N min)` suffix: `Write report (high, 90 min)`.

use chrono::NaiveDateTime;
use serde_json::{Map, Value};

use crate::config::InputConfig;
use crate::deadline::parse_deadline;
use crate::types::{
    Category, DEFAULT_DURATION_MINUTES, MAX_DURATION_MINUTES, Priority, Task, TaskStatus,
};

/// A task as supplied by the user, before defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskDraft {
    pub id: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub estimated_duration: Option<i64>,
    pub deadline: Option<String>,
    pub dependencies: Vec<String>,
    pub status: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub actual_duration: Option<i64>,
}

impl TaskDraft {
    /// Extract whatever fields are usable from a JSON object. Wrong-typed
    /// fields are dropped, not rejected.
    pub fn from_object(obj: &Map<String, Value>) -> Self {
        let duration = ["estimated_duration", "estimated_time", "duration"]
            .iter()
            .find_map(|k| obj.get(*k).and_then(as_int).filter(|n| *n > 0));
        let deadline = ["deadline", "due_date"]
            .iter()
            .find_map(|k| obj.get(*k).and_then(as_text));
        let actual = ["actual_duration", "actual_time"]
            .iter()
            .find_map(|k| obj.get(*k).and_then(as_int));

        Self {
            id: obj.get("id").and_then(as_text),
            name: obj.get("name").and_then(as_text),
            category: obj.get("category").and_then(as_text),
            priority: obj.get("priority").and_then(as_text),
            estimated_duration: duration,
            deadline,
            dependencies: obj.get("dependencies").map(as_text_list).unwrap_or_default(),
            status: obj.get("status").and_then(as_text),
            description: obj.get("description").and_then(as_text),
            tags: obj.get("tags").map(as_text_list).unwrap_or_default(),
            actual_duration: actual,
        }
    }

    /// Parse one plain-text line.
    pub fn from_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if let Some((name, priority, minutes)) = split_suffix(line) {
            return Some(Self {
                name: Some(name.to_string()),
                priority: Some(priority.to_string()),
                estimated_duration: Some(minutes),
                ..Self::default()
            });
        }
        Some(Self {
            name: Some(line.to_string()),
            ..Self::default()
        })
    }

    /// Apply defaults and produce a fully-populated task.
    pub fn normalize(self, now: NaiveDateTime, options: &InputConfig) -> Task {
        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Unnamed Task".to_string());

        let deadline = self.deadline.as_deref().and_then(|raw| {
            let parsed = parse_deadline(raw, now);
            if parsed.is_none() {
                tracing::warn!("⚠️ Ignoring unparseable deadline '{}' on '{}'", raw, name);
            }
            parsed
        });

        let estimated_duration = self
            .estimated_duration
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| (1..=MAX_DURATION_MINUTES).contains(n))
            .unwrap_or(DEFAULT_DURATION_MINUTES);

        let id = match self.id {
            Some(id) => Some(id),
            None if options.assign_missing_ids => Some(generate_task_id()),
            None => None,
        };

        Task {
            id,
            name,
            category: self.category.as_deref().map(Category::parse).unwrap_or_default(),
            priority: self.priority.as_deref().map(Priority::parse).unwrap_or_default(),
            estimated_duration,
            deadline,
            dependencies: self.dependencies,
            status: self.status.as_deref().map(TaskStatus::parse).unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            tags: self.tags,
            actual_duration: self
                .actual_duration
                .and_then(|n| u32::try_from(n).ok())
                .filter(|n| (1..=MAX_DURATION_MINUTES).contains(n)),
        }
    }
}

/// Parse raw user input into drafts.
pub fn parse_input(raw: &str) -> Vec<TaskDraft> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    if let Ok(parsed) = serde_json::from_str::<Value>(raw) {
        match parsed {
            Value::Array(items) => return drafts_from_values(&items),
            Value::Object(obj) => {
                if let Some(Value::Array(items)) = obj.get("tasks") {
                    return drafts_from_values(items);
                }
                return vec![TaskDraft::from_object(&obj)];
            }
            _ => {}
        }
    }

    raw.lines().filter_map(TaskDraft::from_line).collect()
}

/// Parse and normalize in one step.
pub fn normalize_input(raw: &str, now: NaiveDateTime, options: &InputConfig) -> Vec<Task> {
    let tasks: Vec<Task> = parse_input(raw)
        .into_iter()
        .map(|d| d.normalize(now, options))
        .collect();
    tracing::info!("📥 Normalized {} tasks", tasks.len());
    tasks
}

/// Generate a short task id.
pub fn generate_task_id() -> String {
    format!("task_{}", &uuid::Uuid::new_v4().simple().to_string()[..8])
}

fn drafts_from_values(items: &[Value]) -> Vec<TaskDraft> {
    items
        .iter()
        .filter_map(|v| match v {
            Value::Object(obj) => Some(TaskDraft::from_object(obj)),
            Value::String(s) => TaskDraft::from_line(s),
            _ => None,
        })
        .collect()
}

/// `Name (high, 60 min)` → ("Name", "high", 60).
fn split_suffix(line: &str) -> Option<(&str, &str, i64)> {
    let inner = line.strip_suffix(')')?;
    let open = inner.rfind('(')?;
    let name = inner[..open].trim();
    let (priority, duration) = inner[open + 1..].split_once(',')?;
    let priority = priority.trim();
    if !["high", "medium", "low"].contains(&priority.to_lowercase().as_str()) {
        return None;
    }
    let minutes: i64 = duration
        .trim()
        .to_lowercase()
        .strip_suffix("min")?
        .trim()
        .parse()
        .ok()?;
    if name.is_empty() {
        return None;
    }
    Some((name, priority, minutes))
}

fn as_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_int(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_text_list(v: &Value) -> Vec<String> {
    match v {
        Value::Array(items) => items.iter().filter_map(as_text).collect(),
        _ => Vec::new(),
    }
}
