//! Machine catalog - the gym's equipment

use serde::{Deserialize, Serialize};

/// Canonical machine identifier. Parsed once at the input boundary.
pub type MachineId = u32;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Chest,
    Back,
    Shoulders,
    Arms,
    Legs,
    Core,
}

impl Category {
    pub fn name(&self) -> &'static str {
        match self {
            Category::Chest => "chest",
            Category::Back => "back",
            Category::Shoulders => "shoulders",
            Category::Arms => "arms",
            Category::Legs => "legs",
            Category::Core => "core",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Category::Chest => "💪",
            Category::Back => "🏋️",
            Category::Shoulders => "🤸",
            Category::Arms => "🦾",
            Category::Legs => "🦵",
            Category::Core => "🎯",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Machine {
    pub id: MachineId,
    pub name: &'static str,
    pub category: Category,
    pub image: &'static str,
}

pub const MACHINES: &[Machine] = &[
    Machine { id: 1, name: "Chest Press", category: Category::Chest, image: "chest-press.png" },
    Machine { id: 2, name: "Pec Deck", category: Category::Chest, image: "pec-deck.png" },
    Machine { id: 3, name: "Lat Pulldown", category: Category::Back, image: "lat-pulldown.png" },
    Machine { id: 4, name: "Seated Row", category: Category::Back, image: "seated-row.png" },
    Machine { id: 5, name: "Shoulder Press", category: Category::Shoulders, image: "shoulder-press.png" },
    Machine { id: 6, name: "Lateral Raise", category: Category::Shoulders, image: "lateral-raise.png" },
    Machine { id: 7, name: "Biceps Curl", category: Category::Arms, image: "biceps-curl.png" },
    Machine { id: 8, name: "Triceps Extension", category: Category::Arms, image: "triceps-extension.png" },
    Machine { id: 9, name: "Leg Press", category: Category::Legs, image: "leg-press.png" },
    Machine { id: 10, name: "Leg Extension", category: Category::Legs, image: "leg-extension.png" },
    Machine { id: 11, name: "Leg Curl", category: Category::Legs, image: "leg-curl.png" },
    Machine { id: 12, name: "Abdominal Crunch", category: Category::Core, image: "ab-crunch.png" },
];

pub fn all_machines() -> &'static [Machine] {
    MACHINES
}

pub fn find_machine(id: MachineId) -> Option<&'static Machine> {
    MACHINES.iter().find(|m| m.id == id)
}

/// Resolve user input: numeric id or case-insensitive name
pub fn lookup(input: &str) -> Option<&'static Machine> {
    let input = input.trim();
    if let Ok(id) = input.parse::<MachineId>() {
        return find_machine(id);
    }
    MACHINES.iter().find(|m| m.name.eq_ignore_ascii_case(input))
}
