//! Reflection loop: compares what was planned with what got done, decides
//! whether to re-plan, and folds learned patterns back into memory.
//!
//! The re-plan decision uses two triggers only:
//! 1. completion rate below 50%
//! 2. two or more high-priority planned tasks whose id is missing from the
//!    completed set (tasks without an id never match and never count)
//!
//! Habit insights feed the recommendation list, never the decision.

use chrono::{DateTime, Utc};
use dayplan_core::{Priority, Result, Task};
use dayplan_memory::{PreferenceStore, TaskRecord};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;

use crate::habits::{self, CategoryStat, EstimationTendency, round_to};

/// History size at which learned patterns reach full confidence.
const FULL_CONFIDENCE_SAMPLES: f64 = 20.0;

pub const PATTERN_PEAK_HOURS: &str = "peak_productivity_hours";
pub const PATTERN_ESTIMATION: &str = "estimation_tendency";
pub const PATTERN_AVERAGE_DURATION: &str = "average_task_duration";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    Excellent,
    Good,
    Fair,
    NeedsImprovement,
}

impl CompletionStatus {
    pub fn from_rate(rate: f64) -> Self {
        if rate >= 90.0 {
            Self::Excellent
        } else if rate >= 70.0 {
            Self::Good
        } else if rate >= 50.0 {
            Self::Fair
        } else {
            Self::NeedsImprovement
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionAnalysis {
    pub planned_tasks: usize,
    pub completed_tasks: usize,
    pub incomplete_tasks: usize,
    /// Percent, one decimal.
    pub completion_rate: f64,
    pub status: CompletionStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternInsights {
    pub productivity_hours: Vec<u32>,
    pub estimation_tendency: EstimationTendency,
    pub top_categories: Vec<CategoryStat>,
    pub pattern_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLearning {
    pub average_duration: Option<f64>,
    pub task_count: usize,
    pub insight: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplanDecision {
    pub needed: bool,
    pub reason: String,
    pub high_priority_incomplete: usize,
}

/// Outcome of one reflection pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectionDecision {
    /// Percent, 0 when nothing was planned.
    pub completion_rate: f64,
    pub replan_needed: bool,
    pub replan_reason: String,
    pub recommendations: Vec<String>,
    pub completion_analysis: CompletionAnalysis,
    /// `None` when there is no history yet.
    pub pattern_insights: Option<PatternInsights>,
    pub learning_insights: SessionLearning,
    pub reflected_at: DateTime<Utc>,
}

/// Runs reflection against the shared preference store.
#[derive(Debug, Clone, Default)]
pub struct ReflectionLoop;

impl ReflectionLoop {
    pub fn new() -> Self {
        Self
    }

    /// Reflect on a session. Learned patterns are written to `store` before
    /// returning; a store write failure aborts the pass.
    pub fn reflect(
        &self,
        completed: &[Task],
        planned: &[Task],
        store: &PreferenceStore,
    ) -> Result<ReflectionDecision> {
        let history = store.task_history();
        let analysis = analyze_completion(completed, planned);
        let insights = analyze_patterns(&history);
        let learning = learn_from_session(completed);
        let decision = decide_replan(completed, planned);

        self.update_memory(store, insights.as_ref(), &history, &learning)?;

        let recommendations = recommend(&analysis, insights.as_ref());

        if decision.needed {
            tracing::warn!("🔁 Re-plan recommended: {}", decision.reason);
        } else {
            tracing::info!("✅ Reflection: {}", decision.reason);
        }

        Ok(ReflectionDecision {
            completion_rate: analysis.completion_rate,
            replan_needed: decision.needed,
            replan_reason: decision.reason,
            recommendations,
            completion_analysis: analysis,
            pattern_insights: insights,
            learning_insights: learning,
            reflected_at: Utc::now(),
        })
    }

    fn update_memory(
        &self,
        store: &PreferenceStore,
        insights: Option<&PatternInsights>,
        history: &[TaskRecord],
        learning: &SessionLearning,
    ) -> Result<()> {
        let confidence = round_to((history.len() as f64 / FULL_CONFIDENCE_SAMPLES).min(1.0), 2);

        if let Some(insights) = insights {
            if !insights.productivity_hours.is_empty() {
                store.learn_pattern(
                    PATTERN_PEAK_HOURS,
                    json!({ "hours": insights.productivity_hours, "confidence": confidence }),
                )?;
            }
            if insights.estimation_tendency != EstimationTendency::Unknown {
                store.learn_pattern(
                    PATTERN_ESTIMATION,
                    json!({ "tendency": insights.estimation_tendency, "confidence": confidence }),
                )?;
            }
        }

        if let Some(avg) = learning.average_duration {
            let session_confidence =
                round_to((learning.task_count as f64 / FULL_CONFIDENCE_SAMPLES).min(1.0), 2);
            store.learn_pattern(
                PATTERN_AVERAGE_DURATION,
                json!({
                    "minutes": avg,
                    "task_count": learning.task_count,
                    "confidence": session_confidence,
                }),
            )?;
        }
        Ok(())
    }
}

/// Completion rate in percent; 0 when nothing was planned.
pub fn completion_rate(completed: usize, planned: usize) -> f64 {
    if planned == 0 {
        return 0.0;
    }
    completed as f64 / planned as f64 * 100.0
}

pub fn analyze_completion(completed: &[Task], planned: &[Task]) -> CompletionAnalysis {
    let rate = completion_rate(completed.len(), planned.len());
    CompletionAnalysis {
        planned_tasks: planned.len(),
        completed_tasks: completed.len(),
        incomplete_tasks: planned.len().saturating_sub(completed.len()),
        completion_rate: round_to(rate, 1),
        status: CompletionStatus::from_rate(rate),
    }
}

pub fn decide_replan(completed: &[Task], planned: &[Task]) -> ReplanDecision {
    if planned.is_empty() {
        return ReplanDecision {
            needed: false,
            reason: "No planned tasks to review".to_string(),
            high_priority_incomplete: 0,
        };
    }

    let rate = completion_rate(completed.len(), planned.len());
    let mut reasons = Vec::new();

    if rate < 50.0 {
        reasons.push(format!(
            "Low completion rate ({rate:.1}%). Tasks may need re-prioritization."
        ));
    }

    let done: HashSet<&str> = completed.iter().filter_map(|t| t.id.as_deref()).collect();
    let high_incomplete = planned
        .iter()
        .filter(|t| t.priority == Priority::High)
        .filter(|t| t.id.as_deref().is_some_and(|id| !done.contains(id)))
        .count();

    if high_incomplete >= 2 {
        reasons.push(format!(
            "{high_incomplete} high-priority tasks incomplete. Recommend re-planning remaining tasks."
        ));
    }

    ReplanDecision {
        needed: !reasons.is_empty(),
        reason: if reasons.is_empty() {
            "On track, no re-planning needed".to_string()
        } else {
            reasons.join(" ")
        },
        high_priority_incomplete: high_incomplete,
    }
}

pub fn analyze_patterns(history: &[TaskRecord]) -> Option<PatternInsights> {
    if history.is_empty() {
        return None;
    }
    let insights = PatternInsights {
        productivity_hours: habits::productivity_hours(history).peak_hours,
        estimation_tendency: habits::estimation_accuracy(history).tendency,
        top_categories: habits::top_categories(history),
        pattern_count: history.len(),
    };
    tracing::debug!(
        peak = ?insights.productivity_hours,
        tendency = insights.estimation_tendency.as_str(),
        "Patterns analyzed"
    );
    Some(insights)
}

/// Average minutes spent on this session's completed tasks.
pub fn learn_from_session(completed: &[Task]) -> SessionLearning {
    if completed.is_empty() {
        return SessionLearning {
            average_duration: None,
            task_count: 0,
            insight: "No completed tasks to learn from yet.".to_string(),
        };
    }
    let total: u64 = completed
        .iter()
        .map(|t| u64::from(t.actual_duration.unwrap_or(t.estimated_duration)))
        .sum();
    SessionLearning {
        average_duration: Some(round_to(total as f64 / completed.len() as f64, 1)),
        task_count: completed.len(),
        insight: "Learned from completed tasks successfully.".to_string(),
    }
}

/// Status first, then peak hour, then estimation.
pub fn recommend(analysis: &CompletionAnalysis, insights: Option<&PatternInsights>) -> Vec<String> {
    let mut out = Vec::new();
    match analysis.status {
        CompletionStatus::NeedsImprovement => {
            out.push("Consider reducing daily workload or extending deadlines".to_string())
        }
        CompletionStatus::Excellent => {
            out.push("Great job! You can handle slightly more tasks".to_string())
        }
        _ => {}
    }

    if let Some(insights) = insights {
        if let Some(peak) = insights.productivity_hours.first() {
            out.push(format!("Schedule critical tasks around {peak}:00 for best results"));
        }
        match insights.estimation_tendency {
            EstimationTendency::Underestimates => {
                out.push("Add 20-30% buffer to your time estimates".to_string())
            }
            EstimationTendency::Overestimates => {
                out.push("You can reduce time estimates by 15-20%".to_string())
            }
            _ => {}
        }
    }
    out
}
