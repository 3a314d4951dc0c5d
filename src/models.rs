//! Records stored by the tracker

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::machines::MachineId;

/// Perceived difficulty of a session (display only)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(format!("unknown difficulty: {} (easy, medium, hard)", s)),
        }
    }
}

/// One logged set of work on a machine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub machine_id: MachineId,
    pub weight: f64, // kg
    pub reps: u32,
    pub date: DateTime<Utc>,
    pub difficulty: Difficulty,
}

impl Session {
    /// Volume contributed to weekly totals
    pub fn volume(&self) -> f64 {
        self.weight * self.reps as f64
    }
}

/// Session as entered by the user, before an id and owner are assigned
#[derive(Debug, Clone)]
pub struct NewSession {
    pub machine_id: MachineId,
    pub weight: f64,
    pub reps: u32,
    pub date: DateTime<Utc>,
    pub difficulty: Difficulty,
}

/// User profile. Only a hash of the login code is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub code_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Parse an ISO-8601 session date: full RFC 3339 timestamp or bare `YYYY-MM-DD`
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Some(d.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_date_only() {
        let d = parse_date("2024-01-10").unwrap();
        assert_eq!((d.year(), d.month(), d.day()), (2024, 1, 10));
        assert_eq!(d.hour(), 0);
    }

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let d = parse_date("2024-01-10T02:00:00+03:00").unwrap();
        assert_eq!(d.day(), 9);
        assert_eq!(d.hour(), 23);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_date("yesterday").is_none());
        assert!(parse_date("").is_none());
    }

    #[test]
    fn test_difficulty_roundtrip_json() {
        let json = serde_json::to_string(&Difficulty::Hard).unwrap();
        assert_eq!(json, "\"hard\"");
        assert_eq!("EASY".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert!("brutal".parse::<Difficulty>().is_err());
    }

    #[test]
    fn test_session_volume() {
        let s = Session {
            id: "s1".into(),
            user_id: "u1".into(),
            machine_id: 1,
            weight: 12.5,
            reps: 8,
            date: Utc::now(),
            difficulty: Difficulty::Easy,
        };
        assert_eq!(s.volume(), 100.0);
    }
}
