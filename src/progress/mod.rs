//! Progress module - per-machine trends and weekly volume
//!
//! Everything here is a pure function over already-loaded sessions:
//! - Machine trend: last session vs the latest one at least a week older
//! - Weekly volume: weight * reps summed per Sunday-started week

pub mod weekly;

pub use weekly::{WeeklyVolume, weekly_volume_for_user, weight_lifted_by_week, weight_lifted_by_week_in};

use chrono::Duration;
use serde::Serialize;

use crate::machines::{Category, Machine, MachineId};
use crate::models::Session;

/// Days between "last" and the session it is compared against
const TREND_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Change {
    Up,
    Down,
    Same,
    New,
}

impl Change {
    pub fn arrow(&self) -> &'static str {
        match self {
            Change::Up => "▲",
            Change::Down => "▼",
            Change::Same => "=",
            Change::New => "new",
        }
    }
}

/// Trend of a single machine
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trend {
    pub last_weight: Option<f64>,
    pub prev_weight: Option<f64>,
    pub change: Change,
}

impl Trend {
    const EMPTY: Trend = Trend {
        last_weight: None,
        prev_weight: None,
        change: Change::New,
    };
}

/// Trend joined with the machine it belongs to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineProgress {
    pub id: MachineId,
    pub name: String,
    pub category: Category,
    pub last_weight: Option<f64>,
    pub prev_weight: Option<f64>,
    pub change: Change,
}

/// Compare the most recent session on a machine with the most recent one
/// dated strictly more than a week before it.
///
/// `sessions` may contain other machines; they are ignored. Equal dates keep
/// their input order.
pub fn compute_machine_trend(machine_id: MachineId, sessions: &[Session]) -> Trend {
    let mut on_machine: Vec<&Session> = sessions
        .iter()
        .filter(|s| s.machine_id == machine_id)
        .collect();

    if on_machine.is_empty() {
        return Trend::EMPTY;
    }

    // sort_by is stable
    on_machine.sort_by(|a, b| b.date.cmp(&a.date));

    let last = on_machine[0];
    let last_week = last.date - Duration::days(TREND_WINDOW_DAYS);
    let prev = on_machine[1..].iter().find(|s| s.date < last_week);

    let change = match prev {
        None => Change::New,
        Some(p) if last.weight > p.weight => Change::Up,
        Some(p) if last.weight < p.weight => Change::Down,
        Some(_) => Change::Same,
    };

    Trend {
        last_weight: Some(last.weight),
        prev_weight: prev.map(|p| p.weight),
        change,
    }
}

/// One entry per machine, in the order `machines` is given
pub fn machine_progress(machines: &[Machine], sessions: &[Session]) -> Vec<MachineProgress> {
    machines
        .iter()
        .map(|m| {
            let trend = compute_machine_trend(m.id, sessions);
            MachineProgress {
                id: m.id,
                name: m.name.to_string(),
                category: m.category,
                last_weight: trend.last_weight,
                prev_weight: trend.prev_weight,
                change: trend.change,
            }
        })
        .collect()
}

/// Like `machine_progress`, but only machines that have been used
pub fn tracked_progress(machines: &[Machine], sessions: &[Session]) -> Vec<MachineProgress> {
    machine_progress(machines, sessions)
        .into_iter()
        .filter(|p| p.last_weight.is_some())
        .collect()
}
