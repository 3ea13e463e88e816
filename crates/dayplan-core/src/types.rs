//! Task model: the normalized record every pipeline stage works on.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Task priority. Unknown values read as `Medium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Urgency factor used by the scorer.
    pub fn urgency(&self) -> u8 {
        match self {
            Priority::High => 5,
            Priority::Medium => 3,
            Priority::Low => 1,
        }
    }

    /// Schedule order (lower = earlier in the day).
    pub fn order(&self) -> u8 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// Parse leniently; anything unrecognized is `Medium`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "high" => Priority::High,
            "low" => Priority::Low,
            _ => Priority::Medium,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Priority::High => "🔴",
            Priority::Medium => "🟡",
            Priority::Low => "🟢",
        }
    }
}

impl From<String> for Priority {
    fn from(s: String) -> Self {
        Priority::parse(&s)
    }
}

impl From<Priority> for String {
    fn from(p: Priority) -> Self {
        p.as_str().to_string()
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Task category. Open vocabulary: anything not listed is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Meeting,
    Coding,
    Review,
    Planning,
    Learning,
    Email,
    #[default]
    General,
    Other(String),
}

impl Category {
    /// Importance factor used by the scorer.
    pub fn importance(&self) -> u8 {
        match self {
            Category::Meeting => 4,
            Category::Coding | Category::Review | Category::Planning => 3,
            _ => 2,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Category::Meeting => "meeting",
            Category::Coding => "coding",
            Category::Review => "review",
            Category::Planning => "planning",
            Category::Learning => "learning",
            Category::Email => "email",
            Category::General => "general",
            Category::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "meeting" => Category::Meeting,
            "coding" => Category::Coding,
            "review" => Category::Review,
            "planning" => Category::Planning,
            "learning" => Category::Learning,
            "email" => Category::Email,
            "general" | "" => Category::General,
            _ => Category::Other(lower),
        }
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        Category::parse(&s)
    }
}

impl From<Category> for String {
    fn from(c: Category) -> Self {
        c.as_str().to_string()
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "completed" | "done" => TaskStatus::Completed,
            _ => TaskStatus::Pending,
        }
    }
}

/// Default task length in minutes.
pub const DEFAULT_DURATION_MINUTES: u32 = 60;

/// Longest accepted estimate: one week. Larger values fall back to the default.
pub const MAX_DURATION_MINUTES: u32 = 7 * 24 * 60;

/// A normalized unit of work. Every field is populated; downstream stages
/// never apply their own defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Caller-supplied id. May be absent for plain-text input.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub priority: Priority,
    /// Minutes, always > 0.
    pub estimated_duration: u32,
    #[serde(default)]
    pub deadline: Option<NaiveDateTime>,
    /// Preserved but not used for ordering.
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Minutes actually spent, when reported.
    #[serde(default)]
    pub actual_duration: Option<u32>,
}

impl Task {
    /// A pending, medium-priority, general task of default length.
    pub fn new(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            category: Category::General,
            priority: Priority::Medium,
            estimated_duration: DEFAULT_DURATION_MINUTES,
            deadline: None,
            dependencies: Vec::new(),
            status: TaskStatus::Pending,
            description: String::new(),
            tags: Vec::new(),
            actual_duration: None,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Set the estimate; zero falls back to the default length.
    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.estimated_duration = if (1..=MAX_DURATION_MINUTES).contains(&minutes) {
            minutes
        } else {
            DEFAULT_DURATION_MINUTES
        };
        self
    }

    pub fn with_deadline(mut self, deadline: NaiveDateTime) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// User preferences consumed by the scorer and the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// Categories that get a small score boost.
    #[serde(default = "default_morning_categories")]
    pub morning_categories: Vec<String>,
    #[serde(default = "default_max_work_hours")]
    pub max_work_hours: f64,
}

pub const MORNING_CATEGORIES_KEY: &str = "morning_categories";
pub const MAX_WORK_HOURS_KEY: &str = "max_work_hours";

fn default_morning_categories() -> Vec<String> {
    vec!["meeting".into(), "review".into()]
}
fn default_max_work_hours() -> f64 { 8.0 }

impl Default for Preferences {
    fn default() -> Self {
        Self {
            morning_categories: default_morning_categories(),
            max_work_hours: default_max_work_hours(),
        }
    }
}

impl Preferences {
    pub fn prefers_morning(&self, category: &Category) -> bool {
        self.morning_categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case(category.as_str()))
    }

    pub fn max_work_minutes(&self) -> f64 {
        self.max_work_hours * 60.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_lenient_parse() {
        assert_eq!(Priority::parse("HIGH"), Priority::High);
        assert_eq!(Priority::parse("low"), Priority::Low);
        assert_eq!(Priority::parse("urgent"), Priority::Medium);
        assert_eq!(Priority::parse(""), Priority::Medium);
    }

    #[test]
    fn test_category_open_vocabulary() {
        assert_eq!(Category::parse("Meeting"), Category::Meeting);
        assert_eq!(Category::parse("writing"), Category::Other("writing".into()));
        assert_eq!(Category::parse("writing").importance(), 2);
        assert_eq!(Category::Review.importance(), 3);
        assert_eq!(Category::Meeting.importance(), 4);
    }

    #[test]
    fn test_task_serde_shape() {
        let task = Task::new("Docs")
            .with_category(Category::Other("writing".into()))
            .with_duration(90);
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["priority"], "medium");
        assert_eq!(json["category"], "writing");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["estimated_duration"], 90);

        let back: Task = serde_json::from_value(json).unwrap();
        assert_eq!(back, task);
    }

    #[test]
    fn test_zero_duration_defaults() {
        assert_eq!(Task::new("x").with_duration(0).estimated_duration, 60);
    }

    #[test]
    fn test_preferences_defaults() {
        let prefs = Preferences::default();
        assert!(prefs.prefers_morning(&Category::Meeting));
        assert!(prefs.prefers_morning(&Category::Review));
        assert!(!prefs.prefers_morning(&Category::Coding));
        assert_eq!(prefs.max_work_minutes(), 480.0);
    }
}
