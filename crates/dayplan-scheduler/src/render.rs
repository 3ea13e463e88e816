//! Plain-text rendering of a schedule for the terminal and summary files.

use chrono::{DateTime, FixedOffset};
use std::fmt::Write;

use crate::planner::{ScheduleBlock, ScheduleStats};

const RULE_WIDTH: usize = 60;

/// Render the day as text. `generated_at` is passed in so output is reproducible.
pub fn render_schedule(
    blocks: &[ScheduleBlock],
    reminder_count: usize,
    generated_at: DateTime<FixedOffset>,
) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let stats = ScheduleStats::of(blocks);

    let mut out = String::new();
    let _ = writeln!(out, "{heavy}");
    let _ = writeln!(out, "YOUR DAILY SCHEDULE");
    let _ = writeln!(out, "Generated: {}", generated_at.format("%Y-%m-%d %I:%M %p"));
    let _ = writeln!(out, "{heavy}");
    let _ = writeln!(out);

    let _ = writeln!(out, "📊 Overview:");
    let _ = writeln!(out, "   • Total Tasks: {}", stats.task_count);
    let _ = writeln!(out, "   • Work Time: {}", hours_minutes(stats.total_work_minutes));
    let _ = writeln!(out, "   • Break Time: {}", hours_minutes(stats.total_break_minutes));
    let _ = writeln!(out, "   • Reminders Set: {reminder_count}");
    let _ = writeln!(out);

    let _ = writeln!(out, "📅 Detailed Schedule:");
    let _ = writeln!(out, "{light}");
    for block in blocks {
        let span = format!(
            "{} - {}",
            block.start_time.format("%I:%M %p"),
            block.end_time.format("%I:%M %p")
        );
        match (block.priority(), block.category()) {
            (Some(priority), Some(category)) => {
                let _ = writeln!(out, "{} {} ({}min)", priority.icon(), span, block.duration);
                let _ = writeln!(out, "   {}", block.name());
                let _ = writeln!(out, "   Category: {}", category.as_str());
            }
            _ => {
                let _ = writeln!(out, "☕ {} | {}", span, block.name());
            }
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "{heavy}");
    let _ = writeln!(out, "💡 Tips:");
    let _ = writeln!(out, "   • Take breaks regularly to maintain focus");
    let _ = writeln!(out, "   • Check reminders to stay on track");
    let _ = writeln!(out, "   • Adjust priorities if needed during the day");
    let _ = write!(out, "{heavy}");
    out
}

fn hours_minutes(minutes: u32) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}
