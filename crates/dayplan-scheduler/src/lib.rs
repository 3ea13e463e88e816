//! # DayPlan Scheduler
//!
//! Turns normalized tasks into a day: weighted priority scores, a
//! contiguous time-blocked schedule with breaks, and start reminders.
//!
//! ## Flow
//! ```text
//! Vec<Task> → PriorityScorer → RankedTasks → Planner → Vec<ScheduleBlock>
//!                                                      ↓
//!                                               build_reminders
//! ```

pub mod planner;
pub mod priority;
pub mod reminders;
pub mod render;

pub use planner::{BlockKind, Planner, ScheduleBlock, ScheduleStats, anchor_on, day_anchor};
pub use priority::{PriorityScorer, PrioritySummary, RankedTasks, ScoredTask, ScoringDetails};
pub use reminders::{Reminder, build_reminders};
pub use render::render_schedule;
