//! Summary statistics over the completed-task history.

use chrono::Timelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::record::TaskRecord;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct HistoryAnalysis {
    pub total_tasks_completed: usize,
    /// Average actual minutes per category (records without an actual time are skipped).
    pub average_duration_by_category: BTreeMap<String, f64>,
    /// Hour with the most completions; earliest-seen hour wins ties.
    pub most_productive_hour: Option<u32>,
    pub categories_tracked: Vec<String>,
}

pub fn analyze_task_history(history: &[TaskRecord]) -> HistoryAnalysis {
    if history.is_empty() {
        return HistoryAnalysis::default();
    }

    let mut durations: BTreeMap<String, Vec<u32>> = BTreeMap::new();
    let mut hours: Vec<(u32, usize)> = Vec::new();

    for record in history {
        if let Some(actual) = record.actual_duration.filter(|a| *a > 0) {
            durations
                .entry(record.category.as_str().to_string())
                .or_default()
                .push(actual);
        }
        let hour = record.completed_at.hour();
        match hours.iter_mut().find(|(h, _)| *h == hour) {
            Some((_, count)) => *count += 1,
            None => hours.push((hour, 1)),
        }
    }

    let average_duration_by_category = durations
        .iter()
        .map(|(cat, v)| {
            let total: f64 = v.iter().map(|m| f64::from(*m)).sum();
            (cat.clone(), total / v.len() as f64)
        })
        .collect();

    let mut most_productive_hour = None;
    let mut best = 0;
    for (hour, count) in &hours {
        if *count > best {
            best = *count;
            most_productive_hour = Some(*hour);
        }
    }

    tracing::debug!("📊 Analyzed {} history records", history.len());

    HistoryAnalysis {
        total_tasks_completed: history.len(),
        average_duration_by_category,
        most_productive_hour,
        categories_tracked: durations.into_keys().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use dayplan_core::{Category, Task};

    fn at(hour: u32) -> chrono::DateTime<FixedOffset> {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 10, hour, 15, 0)
            .unwrap()
    }

    fn done(category: Category, hour: u32, actual: Option<u32>) -> TaskRecord {
        TaskRecord::from_task(&Task::new("t").with_category(category), at(hour), actual)
    }

    #[test]
    fn test_empty_history() {
        let a = analyze_task_history(&[]);
        assert_eq!(a.total_tasks_completed, 0);
        assert!(a.most_productive_hour.is_none());
    }

    #[test]
    fn test_averages_and_peak_hour() {
        let history = vec![
            done(Category::Coding, 10, Some(90)),
            done(Category::Coding, 14, Some(30)),
            done(Category::Email, 10, Some(10)),
            done(Category::Meeting, 9, None),
        ];
        let a = analyze_task_history(&history);
        assert_eq!(a.total_tasks_completed, 4);
        assert_eq!(a.average_duration_by_category["coding"], 60.0);
        assert_eq!(a.average_duration_by_category["email"], 10.0);
        assert!(!a.average_duration_by_category.contains_key("meeting"));
        assert_eq!(a.most_productive_hour, Some(10));
        assert_eq!(a.categories_tracked, vec!["coding".to_string(), "email".to_string()]);
    }

    #[test]
    fn test_peak_hour_tie_prefers_first_seen() {
        let history = vec![
            done(Category::General, 15, None),
            done(Category::General, 8, None),
        ];
        assert_eq!(analyze_task_history(&history).most_productive_hour, Some(15));
    }
}
