//! gymtrack - Personal gym machine progress tracker
//!
//! Log machine sessions, see which machines go up and how much you lift per week.

pub mod db;
pub mod machines;
pub mod models;
pub mod progress;
pub mod store;
pub mod tracker;
pub mod tui;

pub use db::Database;
pub use store::MemoryStore;
pub use tracker::Tracker;
