//! Habit analysis over completed-task history: when the user gets things
//! done, how good their estimates are, and what they work on most.

use chrono::Timelike;
use dayplan_memory::TaskRecord;
use serde::{Deserialize, Serialize};

const PEAK_HOURS: usize = 3;
const TOP_CATEGORIES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourStats {
    pub hour: u32,
    pub tasks_completed: usize,
    pub avg_duration_minutes: f64,
    /// tasks × 10 + average duration.
    pub productivity_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductivityReport {
    /// Hours in first-seen order.
    pub by_hour: Vec<HourStats>,
    /// Up to three best hours, best first.
    pub peak_hours: Vec<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimationTendency {
    Underestimates,
    Overestimates,
    Accurate,
    #[default]
    Unknown,
}

impl EstimationTendency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Underestimates => "underestimates",
            Self::Overestimates => "overestimates",
            Self::Accurate => "accurate",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EstimationReport {
    pub comparisons: usize,
    /// Mean actual/estimated ratio.
    pub average_ratio: Option<f64>,
    pub average_difference_minutes: Option<f64>,
    pub tendency: EstimationTendency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStat {
    pub category: String,
    pub count: usize,
    pub avg_duration: f64,
}

/// Score each completion hour and pick the best three. Ties keep first-seen order.
pub fn productivity_hours(history: &[TaskRecord]) -> ProductivityReport {
    let mut buckets: Vec<(u32, usize, u32)> = Vec::new();
    for record in history {
        let hour = record.completed_at.hour();
        let minutes = record.actual_duration.unwrap_or(0);
        match buckets.iter_mut().find(|(h, _, _)| *h == hour) {
            Some((_, count, total)) => {
                *count += 1;
                *total = total.saturating_add(minutes);
            }
            None => buckets.push((hour, 1, minutes)),
        }
    }

    let by_hour: Vec<HourStats> = buckets
        .into_iter()
        .map(|(hour, count, total)| {
            let avg = total as f64 / count as f64;
            HourStats {
                hour,
                tasks_completed: count,
                avg_duration_minutes: round_to(avg, 1),
                productivity_score: round_to(count as f64 * 10.0 + avg, 2),
            }
        })
        .collect();

    let mut ranked: Vec<&HourStats> = by_hour.iter().collect();
    ranked.sort_by(|a, b| b.productivity_score.total_cmp(&a.productivity_score));
    let peak_hours = ranked.iter().take(PEAK_HOURS).map(|h| h.hour).collect();

    ProductivityReport { by_hour, peak_hours }
}

/// Compare actual against estimated minutes where both are known.
pub fn estimation_accuracy(history: &[TaskRecord]) -> EstimationReport {
    let pairs: Vec<(f64, f64)> = history
        .iter()
        .filter_map(|r| match (r.estimated_duration, r.actual_duration) {
            (Some(est), Some(act)) if est > 0 && act > 0 => Some((est as f64, act as f64)),
            _ => None,
        })
        .collect();

    if pairs.is_empty() {
        return EstimationReport::default();
    }

    let n = pairs.len() as f64;
    let ratio = pairs.iter().map(|(e, a)| a / e).sum::<f64>() / n;
    let diff = pairs.iter().map(|(e, a)| a - e).sum::<f64>() / n;
    let tendency = if ratio > 1.2 {
        EstimationTendency::Underestimates
    } else if ratio < 0.8 {
        EstimationTendency::Overestimates
    } else {
        EstimationTendency::Accurate
    };

    EstimationReport {
        comparisons: pairs.len(),
        average_ratio: Some(round_to(ratio, 2)),
        average_difference_minutes: Some(round_to(diff, 1)),
        tendency,
    }
}

/// Most frequent categories, at most five.
pub fn top_categories(history: &[TaskRecord]) -> Vec<CategoryStat> {
    let mut stats: Vec<(String, usize, u32)> = Vec::new();
    for record in history {
        let name = record.category.as_str();
        let minutes = record.actual_duration.unwrap_or(0);
        match stats.iter_mut().find(|(c, _, _)| c == name) {
            Some((_, count, total)) => {
                *count += 1;
                *total = total.saturating_add(minutes);
            }
            None => stats.push((name.to_string(), 1, minutes)),
        }
    }
    stats.sort_by(|a, b| b.1.cmp(&a.1));
    stats
        .into_iter()
        .take(TOP_CATEGORIES)
        .map(|(category, count, total)| CategoryStat {
            category,
            count,
            avg_duration: round_to(total as f64 / count as f64, 1),
        })
        .collect()
}

pub(crate) fn round_to(x: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (x * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use dayplan_core::{Category, Task};

    fn record(category: Category, hour: u32, estimated: u32, actual: Option<u32>) -> TaskRecord {
        let at = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 10, hour, 0, 0)
            .unwrap();
        TaskRecord::from_task(
            &Task::new("t").with_category(category).with_duration(estimated),
            at,
            actual,
        )
    }

    #[test]
    fn test_peak_hours() {
        let history = vec![
            record(Category::Coding, 9, 60, Some(60)),
            record(Category::Coding, 9, 60, Some(30)),
            record(Category::Email, 14, 10, Some(10)),
            record(Category::Review, 11, 30, Some(100)),
            record(Category::Email, 16, 10, Some(5)),
        ];
        let report = productivity_hours(&history);
        // 9h: 20 + 45 = 65; 11h: 10 + 100 = 110; 14h: 20; 16h: 15.
        assert_eq!(report.peak_hours, vec![11, 9, 14]);
        assert_eq!(report.by_hour[0].hour, 9);
        assert_eq!(report.by_hour[0].productivity_score, 65.0);
    }

    #[test]
    fn test_peak_hour_ties_keep_first_seen() {
        let history = vec![
            record(Category::General, 15, 30, Some(30)),
            record(Category::General, 8, 30, Some(30)),
        ];
        assert_eq!(productivity_hours(&history).peak_hours, vec![15, 8]);
    }

    #[test]
    fn test_estimation_tendency() {
        let under = vec![
            record(Category::Coding, 9, 60, Some(90)),
            record(Category::Coding, 10, 30, Some(40)),
        ];
        assert_eq!(estimation_accuracy(&under).tendency, EstimationTendency::Underestimates);

        let over = vec![record(Category::Coding, 9, 100, Some(50))];
        let report = estimation_accuracy(&over);
        assert_eq!(report.tendency, EstimationTendency::Overestimates);
        assert_eq!(report.average_ratio, Some(0.5));
        assert_eq!(report.average_difference_minutes, Some(-50.0));

        let ok = vec![record(Category::Coding, 9, 60, Some(65))];
        assert_eq!(estimation_accuracy(&ok).tendency, EstimationTendency::Accurate);
    }

    #[test]
    fn test_estimation_without_actuals_is_unknown() {
        let history = vec![record(Category::Coding, 9, 60, None)];
        let report = estimation_accuracy(&history);
        assert_eq!(report.tendency, EstimationTendency::Unknown);
        assert_eq!(report.comparisons, 0);
        assert!(report.average_ratio.is_none());
    }

    #[test]
    fn test_top_categories() {
        let mut history = Vec::new();
        for (cat, n) in [
            (Category::Email, 1),
            (Category::Coding, 3),
            (Category::Meeting, 2),
            (Category::Review, 1),
            (Category::Learning, 1),
            (Category::Planning, 1),
        ] {
            for _ in 0..n {
                history.push(record(cat.clone(), 10, 30, Some(20)));
            }
        }
        let top = top_categories(&history);
        assert_eq!(top.len(), 5);
        assert_eq!(top[0].category, "coding");
        assert_eq!(top[0].count, 3);
        assert_eq!(top[0].avg_duration, 20.0);
        assert_eq!(top[1].category, "meeting");
        assert_eq!(top[2].category, "email");
        assert!(top.iter().all(|c| c.category != "planning"));
    }
}
