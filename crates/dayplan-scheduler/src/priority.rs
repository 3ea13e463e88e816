//! Priority scoring: a hand-tuned linear rule, not an optimizer.
//!
//! score = 0.4·urgency + 0.4·importance + 0.1·(6 − effort) + deadline bonus
//!
//! Tasks in the user's morning categories get +0.2 afterwards. The final
//! sort is stable, so equal scores keep their input order.

use chrono::NaiveDateTime;
use dayplan_core::deadline::days_until;
use dayplan_core::{Preferences, Priority, Task};
use serde::{Deserialize, Serialize};

/// Boost for tasks in a preferred morning category.
pub const PREFERENCE_BOOST: f64 = 0.2;

/// Factors behind a score. Derived only; never persisted on their own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringDetails {
    pub urgency: u8,
    pub importance: u8,
    pub effort: u8,
    /// Whole days to the deadline; `None` when there is no usable deadline.
    pub deadline_days: Option<i64>,
}

/// A task with its score and 1-based rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredTask {
    #[serde(flatten)]
    pub task: Task,
    pub priority_score: f64,
    pub scoring_details: ScoringDetails,
    pub rank: usize,
    #[serde(default)]
    pub adjusted_for_preferences: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriorityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopTask {
    pub rank: usize,
    pub name: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrioritySummary {
    pub total_tasks: usize,
    pub by_priority: PriorityCounts,
    /// Tasks due within a day. Tasks without a deadline never count.
    pub urgent_tasks_count: usize,
    pub top_tasks: Vec<TopTask>,
}

/// Scorer output: ranked tasks plus a summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankedTasks {
    pub tasks: Vec<ScoredTask>,
    pub summary: PrioritySummary,
}

/// Converts tasks into weighted scores and a ranked list.
#[derive(Debug, Clone, Default)]
pub struct PriorityScorer;

impl PriorityScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score, adjust for preferences, sort, and rank. `now` pins deadline
    /// math so repeated runs rank identically.
    pub fn score_and_rank(
        &self,
        tasks: Vec<Task>,
        preferences: &Preferences,
        now: NaiveDateTime,
    ) -> RankedTasks {
        let mut scored: Vec<ScoredTask> = tasks
            .into_iter()
            .map(|task| self.score_task(task, now))
            .collect();

        for st in scored.iter_mut() {
            if preferences.prefers_morning(&st.task.category) {
                st.priority_score = round2(st.priority_score + PREFERENCE_BOOST);
                st.adjusted_for_preferences = true;
            }
        }

        scored.sort_by(|a, b| b.priority_score.total_cmp(&a.priority_score));
        for (idx, st) in scored.iter_mut().enumerate() {
            st.rank = idx + 1;
        }

        let summary = summarize(&scored);
        tracing::info!(
            "🏁 Ranked {} tasks ({} urgent)",
            summary.total_tasks,
            summary.urgent_tasks_count
        );

        RankedTasks {
            tasks: scored,
            summary,
        }
    }

    /// Score a single task. Rank is filled in later.
    pub fn score_task(&self, task: Task, now: NaiveDateTime) -> ScoredTask {
        let details = ScoringDetails {
            urgency: task.priority.urgency(),
            importance: task.category.importance(),
            effort: effort_for(task.estimated_duration),
            deadline_days: task.deadline.map(|d| days_until(d, now)),
        };
        let score = priority_score(&details);

        tracing::debug!(
            task = %task.name,
            score,
            urgency = details.urgency,
            importance = details.importance,
            effort = details.effort,
            deadline_days = ?details.deadline_days,
            "Scored task"
        );

        ScoredTask {
            task,
            priority_score: score,
            scoring_details: details,
            rank: 0,
            adjusted_for_preferences: false,
        }
    }
}

/// Effort bucket from estimated minutes (1 = quick, 5 = very long).
pub fn effort_for(minutes: u32) -> u8 {
    match minutes {
        0..=30 => 1,
        31..=60 => 2,
        61..=120 => 3,
        121..=180 => 4,
        _ => 5,
    }
}

/// Step bonus for a near deadline. Unknown deadlines get nothing.
pub fn deadline_bonus(deadline_days: Option<i64>) -> f64 {
    match deadline_days {
        Some(d) if d <= 1 => 0.5,
        Some(d) if d <= 3 => 0.3,
        Some(d) if d <= 7 => 0.1,
        _ => 0.0,
    }
}

/// Composite score, rounded to 2 decimals.
pub fn priority_score(details: &ScoringDetails) -> f64 {
    let base = 0.4 * details.urgency as f64 + 0.4 * details.importance as f64;
    let effort = 0.1 * (6 - details.effort as i32) as f64;
    round2(base + effort + deadline_bonus(details.deadline_days))
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn summarize(tasks: &[ScoredTask]) -> PrioritySummary {
    let count = |p: Priority| tasks.iter().filter(|t| t.task.priority == p).count();
    PrioritySummary {
        total_tasks: tasks.len(),
        by_priority: PriorityCounts {
            high: count(Priority::High),
            medium: count(Priority::Medium),
            low: count(Priority::Low),
        },
        urgent_tasks_count: tasks
            .iter()
            .filter(|t| t.scoring_details.deadline_days.is_some_and(|d| d <= 1))
            .count(),
        top_tasks: tasks
            .iter()
            .take(3)
            .map(|t| TopTask {
                rank: t.rank,
                name: t.task.name.clone(),
                score: t.priority_score,
            })
            .collect(),
    }
}
