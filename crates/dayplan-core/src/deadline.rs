//! Deadline parsing.
//! Accepts ISO-8601 date-times and dates, a few day-first/month-first
//! layouts, and the relative forms "today", "tomorrow", "in N days".
//! Anything else is treated as no deadline.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Checked in order; the first layout that parses wins.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%m/%d/%Y", "%d/%m/%Y"];

/// Parse a deadline relative to `now` (local wall-clock time).
pub fn parse_deadline(raw: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt);
        }
    }

    let lower = text.to_lowercase();
    if let Some(days) = relative_days(&lower) {
        // Out-of-range offsets count as no deadline.
        return Duration::try_days(days).and_then(|d| now.checked_add_signed(d));
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

/// Whole days from `now` until `deadline`, floored at zero.
pub fn days_until(deadline: NaiveDateTime, now: NaiveDateTime) -> i64 {
    (deadline - now).num_days().max(0)
}

fn relative_days(text: &str) -> Option<i64> {
    match text {
        "today" => return Some(0),
        "tomorrow" => return Some(1),
        _ => {}
    }
    let rest = text.strip_prefix("in ")?;
    let mut parts = rest.split_whitespace();
    let n: i64 = parts.next()?.parse().ok()?;
    match parts.next()? {
        "day" | "days" => Some(n),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 10)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_iso_datetime() {
        let d = parse_deadline("2026-03-12T17:30:00", now()).unwrap();
        assert_eq!(d.to_string(), "2026-03-12 17:30:00");
    }

    #[test]
    fn test_iso_date_is_midnight() {
        let d = parse_deadline("2026-03-15", now()).unwrap();
        assert_eq!(d.to_string(), "2026-03-15 00:00:00");
    }

    #[test]
    fn test_relative_forms() {
        assert_eq!(parse_deadline("today", now()), Some(now()));
        assert_eq!(parse_deadline("Tomorrow", now()), Some(now() + Duration::days(1)));
        assert_eq!(parse_deadline("in 3 days", now()), Some(now() + Duration::days(3)));
        assert_eq!(parse_deadline("in 1 day", now()), Some(now() + Duration::days(1)));
        assert_eq!(parse_deadline("in a while", now()), None);
    }

    #[test]
    fn test_relative_offset_out_of_range_is_none() {
        assert_eq!(parse_deadline("in 99999999999 days", now()), None);
        assert_eq!(parse_deadline("in 9223372036854775807 days", now()), None);
    }

    #[test]
    fn test_day_first_layout() {
        let d = parse_deadline("20-03-2026", now()).unwrap();
        assert_eq!(d.date(), NaiveDate::from_ymd_opt(2026, 3, 20).unwrap());
    }

    #[test]
    fn test_slash_layout_prefers_month_first() {
        let d = parse_deadline("04/05/2026", now()).unwrap();
        assert_eq!(d.date(), NaiveDate::from_ymd_opt(2026, 4, 5).unwrap());
        let d = parse_deadline("25/04/2026", now()).unwrap();
        assert_eq!(d.date(), NaiveDate::from_ymd_opt(2026, 4, 25).unwrap());
    }

    #[test]
    fn test_garbage_is_none() {
        assert_eq!(parse_deadline("someday soon", now()), None);
        assert_eq!(parse_deadline("", now()), None);
        assert_eq!(parse_deadline("2026-13-45", now()), None);
    }

    #[test]
    fn test_days_until_floors_at_zero() {
        let past = now() - Duration::days(4);
        assert_eq!(days_until(past, now()), 0);
        assert_eq!(days_until(now() + Duration::hours(30), now()), 1);
        assert_eq!(days_until(now() + Duration::days(9), now()), 9);
    }
}
