//! Reminders: one per task block, fired ahead of the start time.
//! Meetings get 15 minutes of warning, high-priority work 5, the rest none.

use chrono::{DateTime, Duration, FixedOffset};
use dayplan_core::{Category, Priority};
use serde::{Deserialize, Serialize};

use crate::planner::ScheduleBlock;

/// A reminder for one scheduled task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub reminder_id: String,
    pub task_name: String,
    #[serde(default)]
    pub task_id: Option<String>,
    pub reminder_time: DateTime<FixedOffset>,
    pub task_start_time: DateTime<FixedOffset>,
    /// Minutes between the reminder and the task start.
    pub lead_minutes: u32,
    pub priority: Priority,
    pub message: String,
}

impl Reminder {
    /// Whether the reminder should have fired by `now`.
    pub fn is_due(&self, now: DateTime<FixedOffset>) -> bool {
        self.reminder_time <= now
    }
}

/// Warning time for a task.
pub fn lead_minutes(category: &Category, priority: Priority) -> u32 {
    if *category == Category::Meeting {
        15
    } else if priority == Priority::High {
        5
    } else {
        0
    }
}

/// Build reminders for every task block, in schedule order.
pub fn build_reminders(blocks: &[ScheduleBlock]) -> Vec<Reminder> {
    let reminders: Vec<Reminder> = blocks
        .iter()
        .filter(|b| b.is_task())
        .enumerate()
        .map(|(idx, block)| {
            let priority = block.priority().unwrap_or_default();
            let lead = block
                .category()
                .map(|c| lead_minutes(c, priority))
                .unwrap_or(0);
            let at = block.start_time.format("%I:%M %p");
            let message = if lead == 0 {
                format!("⏰ Time to start: {} (scheduled for {})", block.name(), at)
            } else {
                format!("⏰ Reminder: {} starts in {} minutes at {}", block.name(), lead, at)
            };
            let suffix = block
                .task_id()
                .map(str::to_string)
                .unwrap_or_else(|| (idx + 1).to_string());

            Reminder {
                reminder_id: format!("reminder_{suffix}"),
                task_name: block.name().to_string(),
                task_id: block.task_id().map(str::to_string),
                reminder_time: block.start_time - Duration::minutes(lead as i64),
                task_start_time: block.start_time,
                lead_minutes: lead,
                priority,
                message,
            }
        })
        .collect();

    tracing::info!("⏰ Set {} reminders", reminders.len());
    reminders
}

/// Reminders that have fired by `now` and whose task has not started yet.
pub fn pending_at(reminders: &[Reminder], now: DateTime<FixedOffset>) -> Vec<&Reminder> {
    reminders
        .iter()
        .filter(|r| r.is_due(now) && r.task_start_time >= now)
        .collect()
}
