//! Planner: lays ranked tasks out as contiguous time blocks from the
//! start of the work day, with a break after every task.
//!
//! Ordering is (priority high→low, then deadline earliest-first with no
//! deadline last). The sort is stable, so ties keep the scorer's rank order.
//! No end-of-day cap is applied here; the evaluator judges plan length.

use chrono::{
    DateTime, Duration, FixedOffset, Local, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc,
};
use dayplan_core::config::{BreakConfig, WorkdayConfig};
use dayplan_core::{Category, Priority};
use serde::{Deserialize, Serialize};

use crate::priority::ScoredTask;

/// What occupies a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    Task {
        name: String,
        category: Category,
        priority: Priority,
        #[serde(default)]
        task_id: Option<String>,
    },
    Break {
        name: String,
    },
}

/// One contiguous interval of the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleBlock {
    #[serde(flatten)]
    pub kind: BlockKind,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    /// Minutes.
    pub duration: u32,
}

impl ScheduleBlock {
    pub fn is_task(&self) -> bool {
        matches!(self.kind, BlockKind::Task { .. })
    }

    pub fn is_break(&self) -> bool {
        matches!(self.kind, BlockKind::Break { .. })
    }

    pub fn name(&self) -> &str {
        match &self.kind {
            BlockKind::Task { name, .. } | BlockKind::Break { name } => name,
        }
    }

    /// Priority of a task block; breaks have none.
    pub fn priority(&self) -> Option<Priority> {
        match &self.kind {
            BlockKind::Task { priority, .. } => Some(*priority),
            BlockKind::Break { .. } => None,
        }
    }

    pub fn category(&self) -> Option<&Category> {
        match &self.kind {
            BlockKind::Task { category, .. } => Some(category),
            BlockKind::Break { .. } => None,
        }
    }

    pub fn task_id(&self) -> Option<&str> {
        match &self.kind {
            BlockKind::Task { task_id, .. } => task_id.as_deref(),
            BlockKind::Break { .. } => None,
        }
    }
}

/// Totals over a built schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleStats {
    pub task_count: usize,
    pub break_count: usize,
    pub total_work_minutes: u32,
    pub total_break_minutes: u32,
}

impl ScheduleStats {
    pub fn of(blocks: &[ScheduleBlock]) -> Self {
        blocks.iter().fold(Self::default(), |mut acc, b| {
            if b.is_task() {
                acc.task_count += 1;
                acc.total_work_minutes = acc.total_work_minutes.saturating_add(b.duration);
            } else {
                acc.break_count += 1;
                acc.total_break_minutes = acc.total_break_minutes.saturating_add(b.duration);
            }
            acc
        })
    }
}

fn advance(from: DateTime<FixedOffset>, minutes: u32) -> Option<DateTime<FixedOffset>> {
    from.checked_add_signed(Duration::minutes(i64::from(minutes)))
}

/// Builds time-blocked schedules.
#[derive(Debug, Clone, Default)]
pub struct Planner {
    breaks: BreakConfig,
}

impl Planner {
    pub fn new(breaks: BreakConfig) -> Self {
        Self { breaks }
    }

    /// Lay tasks out starting at `anchor`. Same input, same anchor, same blocks.
    pub fn build_schedule(
        &self,
        ranked: &[ScoredTask],
        anchor: DateTime<FixedOffset>,
    ) -> Vec<ScheduleBlock> {
        let mut ordered: Vec<&ScoredTask> = ranked.iter().collect();
        ordered.sort_by_key(|st| {
            (
                st.task.priority.order(),
                st.task.deadline.is_none(),
                st.task.deadline,
            )
        });

        let mut blocks = Vec::with_capacity(ordered.len() * 2);
        let mut cursor = anchor;

        for st in ordered {
            let task = &st.task;
            let Some(end) = advance(cursor, task.estimated_duration) else {
                tracing::warn!("⚠️ Schedule runs past the calendar at '{}', stopping", task.name);
                break;
            };
            blocks.push(ScheduleBlock {
                kind: BlockKind::Task {
                    name: task.name.clone(),
                    category: task.category.clone(),
                    priority: task.priority,
                    task_id: task.id.clone(),
                },
                start_time: cursor,
                end_time: end,
                duration: task.estimated_duration,
            });
            cursor = end;

            let pause = self.breaks.after(task.estimated_duration);
            if pause > 0 {
                let Some(end) = advance(cursor, pause) else {
                    break;
                };
                blocks.push(ScheduleBlock {
                    kind: BlockKind::Break {
                        name: format!("{pause}-minute break"),
                    },
                    start_time: cursor,
                    end_time: end,
                    duration: pause,
                });
                cursor = end;
            }
        }

        let stats = ScheduleStats::of(&blocks);
        tracing::info!(
            "📅 Built schedule: {} tasks, {}m work, {}m breaks, ends {}",
            stats.task_count,
            stats.total_work_minutes,
            stats.total_break_minutes,
            cursor.format("%H:%M")
        );
        blocks
    }
}

/// Start of the work day on `date`, in local time.
pub fn day_anchor(date: NaiveDate, workday: &WorkdayConfig) -> DateTime<FixedOffset> {
    let naive = date
        .and_hms_opt(workday.start_hour, workday.start_minute, 0)
        .unwrap_or_else(|| date.and_time(NaiveTime::MIN));
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.fixed_offset(),
        LocalResult::Ambiguous(first, _) => first.fixed_offset(),
        // DST gap.
        LocalResult::None => Utc.from_utc_datetime(&naive).fixed_offset(),
    }
}

/// Start of the work day on `now`'s calendar date, keeping `now`'s offset.
pub fn anchor_on(now: DateTime<FixedOffset>, workday: &WorkdayConfig) -> DateTime<FixedOffset> {
    let naive = now
        .date_naive()
        .and_hms_opt(workday.start_hour, workday.start_minute, 0)
        .unwrap_or_else(|| now.date_naive().and_time(NaiveTime::MIN));
    now.offset()
        .from_local_datetime(&naive)
        .single()
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::priority::PriorityScorer;
    use chrono::NaiveDateTime;
    use dayplan_core::{Preferences, Task};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 10)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn anchor() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 10, 9, 0, 0)
            .unwrap()
    }

    fn rank(tasks: Vec<Task>) -> Vec<ScoredTask> {
        PriorityScorer::new()
            .score_and_rank(tasks, &Preferences::default(), now())
            .tasks
    }

    #[test]
    fn test_standup_then_docs() {
        let ranked = rank(vec![
            Task::new("Docs").with_duration(90),
            Task::new("Standup")
                .with_priority(Priority::High)
                .with_category(Category::Meeting)
                .with_duration(30),
        ]);
        let blocks = Planner::default().build_schedule(&ranked, anchor());
        let shape: Vec<(&str, String, u32)> = blocks
            .iter()
            .map(|b| (b.name(), b.start_time.format("%H:%M").to_string(), b.duration))
            .collect();
        assert_eq!(
            shape,
            vec![
                ("Standup", "09:00".to_string(), 30),
                ("5-minute break", "09:30".to_string(), 5),
                ("Docs", "09:35".to_string(), 90),
                ("15-minute break", "11:05".to_string(), 15),
            ]
        );
        assert_eq!(blocks[3].end_time.format("%H:%M").to_string(), "11:20");
    }

    #[test]
    fn test_blocks_are_contiguous() {
        let ranked = rank(vec![
            Task::new("a").with_duration(45),
            Task::new("b").with_priority(Priority::Low).with_duration(120),
            Task::new("c").with_priority(Priority::High).with_duration(10),
        ]);
        let blocks = Planner::default().build_schedule(&ranked, anchor());
        assert_eq!(blocks[0].start_time, anchor());
        for pair in blocks.windows(2) {
            assert_eq!(pair[0].end_time, pair[1].start_time);
        }
        for b in &blocks {
            assert_eq!((b.end_time - b.start_time).num_minutes(), b.duration as i64);
        }
        assert_eq!(blocks.len(), 6);
        assert!(blocks.iter().skip(1).step_by(2).all(|b| b.is_break()));
    }

    #[test]
    fn test_deadline_breaks_priority_ties() {
        let ranked = rank(vec![
            Task::new("no deadline"),
            Task::new("later").with_deadline(now() + Duration::days(5)),
            Task::new("sooner").with_deadline(now() + Duration::days(2)),
        ]);
        let blocks = Planner::default().build_schedule(&ranked, anchor());
        let names: Vec<&str> = blocks.iter().filter(|b| b.is_task()).map(|b| b.name()).collect();
        assert_eq!(names, vec!["sooner", "later", "no deadline"]);
    }

    #[test]
    fn test_priority_ordering_ignores_score() {
        // Low priority with an imminent deadline still goes after medium.
        let ranked = rank(vec![
            Task::new("low urgent")
                .with_priority(Priority::Low)
                .with_category(Category::Meeting)
                .with_deadline(now()),
            Task::new("medium"),
        ]);
        let blocks = Planner::default().build_schedule(&ranked, anchor());
        assert_eq!(blocks[0].name(), "medium");
    }

    #[test]
    fn test_deterministic() {
        let ranked = rank(vec![Task::new("x"), Task::new("y").with_duration(200)]);
        let planner = Planner::default();
        let a = serde_json::to_string(&planner.build_schedule(&ranked, anchor())).unwrap();
        let b = serde_json::to_string(&planner.build_schedule(&ranked, anchor())).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_block_serde_shape() {
        let ranked = rank(vec![Task::new("Write").with_id("t1")]);
        let blocks = Planner::default().build_schedule(&ranked, anchor());
        let json = serde_json::to_value(&blocks).unwrap();
        assert_eq!(json[0]["type"], "task");
        assert_eq!(json[0]["task_id"], "t1");
        assert_eq!(json[0]["priority"], "medium");
        assert_eq!(json[0]["start_time"], "2026-03-10T09:00:00+00:00");
        assert_eq!(json[1]["type"], "break");
        assert_eq!(json[1]["name"], "15-minute break");

        let back: Vec<ScheduleBlock> = serde_json::from_value(json).unwrap();
        assert_eq!(back, blocks);
    }

    #[test]
    fn test_custom_breaks() {
        let breaks = BreakConfig {
            long_minutes: 20,
            short_minutes: 0,
            long_after_minutes: 90,
        };
        let ranked = rank(vec![
            Task::new("short").with_duration(30),
            Task::new("long").with_duration(90),
        ]);
        let blocks = Planner::new(breaks).build_schedule(&ranked, anchor());
        let names: Vec<&str> = blocks.iter().map(|b| b.name()).collect();
        assert_eq!(names, vec!["short", "long", "20-minute break"]);
    }

    #[test]
    fn test_stats() {
        let ranked = rank(vec![Task::new("a").with_duration(30), Task::new("b").with_duration(60)]);
        let stats = ScheduleStats::of(&Planner::default().build_schedule(&ranked, anchor()));
        assert_eq!(stats.task_count, 2);
        assert_eq!(stats.break_count, 2);
        assert_eq!(stats.total_work_minutes, 90);
        assert_eq!(stats.total_break_minutes, 20);
    }

    #[test]
    fn test_huge_durations_saturate_totals() {
        let mut a = Task::new("a");
        a.estimated_duration = u32::MAX;
        let mut b = Task::new("b");
        b.estimated_duration = u32::MAX;
        let blocks = Planner::default().build_schedule(&rank(vec![a, b]), anchor());
        assert_eq!(blocks.len(), 4);
        let stats = ScheduleStats::of(&blocks);
        assert_eq!(stats.total_work_minutes, u32::MAX);
        assert_eq!(stats.total_break_minutes, 30);
    }

    #[test]
    fn test_layout_stops_at_calendar_end() {
        let late = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(262_000, 1, 1, 9, 0, 0)
            .unwrap();
        let mut huge = Task::new("forever");
        huge.estimated_duration = u32::MAX;
        let ranked = rank(vec![Task::new("first").with_duration(30), huge]);
        let blocks = Planner::default().build_schedule(&ranked, late);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].name(), "first");
    }

    #[test]
    fn test_anchor_on_keeps_offset() {
        let now = FixedOffset::east_opt(7 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 10, 16, 45, 0)
            .unwrap();
        let a = anchor_on(now, &WorkdayConfig::default());
        assert_eq!(a.to_rfc3339(), "2026-03-10T09:00:00+07:00");
    }

    #[test]
    fn test_day_anchor_uses_workday_start() {
        let date = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let workday = WorkdayConfig { start_hour: 8, start_minute: 30 };
        let a = day_anchor(date, &workday);
        assert_eq!(a.format("%H:%M").to_string(), "08:30");
        assert_eq!(a.date_naive(), date);
    }
}
