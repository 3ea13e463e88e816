//! Plan evaluator: grades a schedule on four independent criteria.
//!
//! Each criterion starts at 25 and loses points per rule, clamped to
//! [0, 25]. Durations and positions count task blocks only; breaks matter
//! only to the "has breaks" check.

use dayplan_core::{Preferences, Priority, Task};
use dayplan_scheduler::ScheduleBlock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Points available per criterion.
pub const CRITERION_MAX: i32 = 25;
pub const MAX_SCORE: u32 = 100;

/// Below this a criterion gets a feedback line.
const FEEDBACK_THRESHOLD: u32 = 15;
/// Below this a criterion gets a recommendation.
const RECOMMENDATION_THRESHOLD: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_total(total: u32) -> Self {
        match total {
            90.. => Grade::A,
            80..=89 => Grade::B,
            70..=79 => Grade::C,
            60..=69 => Grade::D,
            _ => Grade::F,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        f.write_str(s)
    }
}

/// The four criterion scores, each in [0, 25].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub time_efficiency: u32,
    pub priority_alignment: u32,
    pub feasibility: u32,
    pub work_life_balance: u32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u32 {
        self.time_efficiency + self.priority_alignment + self.feasibility + self.work_life_balance
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub total_score: u32,
    pub max_score: u32,
    pub percentage: f64,
    pub grade: Grade,
    pub scores_breakdown: ScoreBreakdown,
    pub feedback: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Scores schedules. Stateless; a pure function of its inputs.
#[derive(Debug, Clone, Default)]
pub struct PlanEvaluator;

impl PlanEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(
        &self,
        schedule: &[ScheduleBlock],
        original_tasks: &[Task],
        preferences: &Preferences,
    ) -> EvaluationResult {
        let tasks: Vec<&ScheduleBlock> = schedule.iter().filter(|b| b.is_task()).collect();
        let total_minutes = tasks
            .iter()
            .fold(0u32, |acc, b| acc.saturating_add(b.duration));
        let has_breaks = schedule.iter().any(|b| b.is_break());

        tracing::debug!(
            scheduled = tasks.len(),
            submitted = original_tasks.len(),
            total_minutes,
            "Evaluating plan"
        );

        let scores = ScoreBreakdown {
            time_efficiency: time_efficiency(tasks.len(), total_minutes),
            priority_alignment: priority_alignment(&tasks),
            feasibility: feasibility(&tasks, total_minutes),
            work_life_balance: work_life_balance(has_breaks, total_minutes, preferences),
        };
        let total = scores.total();
        let grade = Grade::from_total(total);

        tracing::info!("📝 Plan scored {}/{} (grade {})", total, MAX_SCORE, grade);

        EvaluationResult {
            total_score: total,
            max_score: MAX_SCORE,
            percentage: (total as f64 / MAX_SCORE as f64 * 1000.0).round() / 10.0,
            grade,
            scores_breakdown: scores,
            feedback: feedback(&scores),
            recommendations: recommendations(&scores),
        }
    }
}

fn clamp(score: i32) -> u32 {
    score.clamp(0, CRITERION_MAX) as u32
}

fn time_efficiency(task_count: usize, total_minutes: u32) -> u32 {
    if task_count == 0 {
        return 0;
    }
    let mut score = CRITERION_MAX;
    if !(360..=480).contains(&total_minutes) {
        score -= 5;
    }
    if task_count < 3 {
        score -= 3;
    }
    clamp(score)
}

fn priority_alignment(tasks: &[&ScheduleBlock]) -> u32 {
    let mut score = CRITERION_MAX;
    for (idx, block) in tasks.iter().enumerate() {
        match block.priority() {
            Some(Priority::High) if idx > 2 => score -= 3,
            Some(Priority::Low) if idx == 0 => score -= 2,
            _ => {}
        }
    }
    clamp(score)
}

fn feasibility(tasks: &[&ScheduleBlock], total_minutes: u32) -> u32 {
    let mut score = CRITERION_MAX;
    if total_minutes > 540 {
        score -= 10;
    } else if total_minutes > 480 {
        score -= 5;
    }
    score -= 2 * tasks.iter().filter(|b| b.duration > 180).count() as i32;
    clamp(score)
}

fn work_life_balance(has_breaks: bool, total_minutes: u32, preferences: &Preferences) -> u32 {
    let mut score = CRITERION_MAX;
    if !has_breaks {
        score -= 5;
    }
    if total_minutes > 600 {
        score -= 10;
    }
    if total_minutes as f64 > preferences.max_work_minutes() {
        score -= 5;
    }
    clamp(score)
}

fn feedback(scores: &ScoreBreakdown) -> Vec<String> {
    let mut out = Vec::new();
    if scores.time_efficiency < FEEDBACK_THRESHOLD {
        out.push(
            "Time efficiency could be improved. Consider optimizing task scheduling.".to_string(),
        );
    }
    if scores.priority_alignment < FEEDBACK_THRESHOLD {
        out.push("High-priority tasks should be scheduled earlier in the day.".to_string());
    }
    if scores.feasibility < FEEDBACK_THRESHOLD {
        out.push(
            "The plan might be too ambitious. Consider reducing workload or extending timeline."
                .to_string(),
        );
    }
    if scores.work_life_balance < FEEDBACK_THRESHOLD {
        out.push(
            "Don't forget work-life balance. Add breaks and limit total work hours.".to_string(),
        );
    }
    if out.is_empty() {
        out.push("Excellent plan! Well-balanced and achievable.".to_string());
    }
    out
}

fn recommendations(scores: &ScoreBreakdown) -> Vec<String> {
    let rules = [
        (scores.time_efficiency, "Add more tasks to fill available time efficiently"),
        (scores.priority_alignment, "Move high-priority tasks to morning slots"),
        (scores.feasibility, "Reduce task durations or split complex tasks"),
        (scores.work_life_balance, "Schedule 15-minute breaks every 90 minutes"),
    ];
    rules
        .iter()
        .filter(|(score, _)| *score < RECOMMENDATION_THRESHOLD)
        .map(|(_, text)| text.to_string())
        .collect()
}
