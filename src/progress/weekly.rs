//! Weekly lifted volume, bucketed by the Sunday that starts each week

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, Local, NaiveDate, TimeZone};
use serde::Serialize;

use crate::models::Session;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyVolume {
    /// Sunday starting the week
    pub week: NaiveDate,
    /// Sum of weight * reps, kg
    pub total: f64,
}

impl WeeklyVolume {
    pub fn week_key(&self) -> String {
        self.week.format("%Y-%m-%d").to_string()
    }
}

/// Sunday on or before `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

/// Weekly totals using the local calendar
pub fn weight_lifted_by_week(sessions: &[Session]) -> Vec<WeeklyVolume> {
    weight_lifted_by_week_in(sessions, &Local)
}

/// Weekly totals with calendar days taken in `tz`, ascending by week
pub fn weight_lifted_by_week_in<Tz: TimeZone>(sessions: &[Session], tz: &Tz) -> Vec<WeeklyVolume> {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();

    for s in sessions {
        let day = s.date.with_timezone(tz).date_naive();
        *totals.entry(week_start(day)).or_insert(0.0) += s.volume();
    }

    totals
        .into_iter()
        .map(|(week, total)| WeeklyVolume { week, total })
        .collect()
}

/// Weekly totals for one user. A missing or empty user id means no data.
pub fn weekly_volume_for_user(user_id: Option<&str>, sessions: &[Session]) -> Vec<WeeklyVolume> {
    let Some(user_id) = user_id.filter(|id| !id.is_empty()) else {
        return Vec::new();
    };

    let own: Vec<Session> = sessions
        .iter()
        .filter(|s| s.user_id == user_id)
        .cloned()
        .collect();
    weight_lifted_by_week(&own)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::models::{Difficulty, parse_date};

    fn session(user: &str, weight: f64, reps: u32, date: &str) -> Session {
        Session {
            id: format!("{}-{}", user, date),
            user_id: user.to_string(),
            machine_id: 1,
            weight,
            reps,
            date: parse_date(date).unwrap(),
            difficulty: Difficulty::Easy,
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_week_start() {
        // 2024-01-07 is a Sunday
        assert_eq!(week_start(day("2024-01-07")), day("2024-01-07"));
        assert_eq!(week_start(day("2024-01-10")), day("2024-01-07"));
        assert_eq!(week_start(day("2024-01-13")), day("2024-01-07"));
        assert_eq!(week_start(day("2024-01-01")), day("2023-12-31"));
    }

    #[test]
    fn test_empty() {
        assert!(weight_lifted_by_week_in(&[], &Utc).is_empty());
    }

    #[test]
    fn test_same_week_sums() {
        let sessions = vec![
            session("u1", 5.0, 10, "2024-01-08"),
            session("u1", 10.0, 5, "2024-01-11"),
        ];
        let weeks = weight_lifted_by_week_in(&sessions, &Utc);
        assert_eq!(weeks.len(), 1);
        assert_eq!(weeks[0].week_key(), "2024-01-07");
        assert_eq!(weeks[0].total, 100.0);
    }

    #[test]
    fn test_sorted_and_idempotent() {
        let sessions = vec![
            session("u1", 20.0, 10, "2024-02-15"),
            session("u1", 10.0, 10, "2024-01-02"),
            session("u1", 15.0, 10, "2024-01-20"),
        ];
        let first = weight_lifted_by_week_in(&sessions, &Utc);
        let second = weight_lifted_by_week_in(&sessions, &Utc);
        assert_eq!(first, second);

        let keys: Vec<_> = first.iter().map(|w| w.week_key()).collect();
        assert_eq!(keys, vec!["2023-12-31", "2024-01-14", "2024-02-11"]);
        assert_eq!(first[1].total, 150.0);
    }

    #[test]
    fn test_default_uses_local_calendar() {
        let sessions = vec![
            session("u1", 20.0, 5, "2024-03-02T23:30:00Z"),
            session("u1", 10.0, 10, "2024-03-03T00:30:00Z"),
            session("u1", 8.0, 10, "2024-03-10T12:00:00Z"),
        ];
        assert_eq!(weight_lifted_by_week(&sessions), weight_lifted_by_week_in(&sessions, &Local));

        let total: f64 = weight_lifted_by_week(&sessions).iter().map(|w| w.total).sum();
        assert_eq!(total, 280.0);
    }

    #[test]
    fn test_user_filter() {
        let sessions = vec![
            session("u1", 10.0, 10, "2024-01-08"),
            session("u2", 99.0, 10, "2024-01-08"),
        ];
        assert!(weekly_volume_for_user(None, &sessions).is_empty());
        assert!(weekly_volume_for_user(Some(""), &sessions).is_empty());

        let weeks = weekly_volume_for_user(Some("u1"), &sessions);
        let total: f64 = weeks.iter().map(|w| w.total).sum();
        assert_eq!(total, 100.0);
    }
}
