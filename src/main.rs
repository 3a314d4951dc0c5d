//! gymtrack - Personal gym machine progress tracker

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gymtrack::machines::{all_machines, find_machine, lookup};
use gymtrack::models::{Difficulty, NewSession, parse_date};
use gymtrack::progress::tracked_progress;
use gymtrack::store::{DocumentStore, KeyValueStore};
use gymtrack::tui::App;
use gymtrack::{Database, MemoryStore, Tracker};

#[derive(Parser)]
#[command(name = "gymtrack")]
#[command(author, version, about = "Personal gym machine progress tracker")]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "GYMTRACK_DB", default_value = "gymtrack.db", global = true)]
    db: String,

    /// Keep everything in memory for this run
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open TUI dashboard
    Tui,

    /// Manage profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Log in with a profile name and 4-digit code
    Login { name: String, code: String },

    /// Forget the logged-in profile
    Logout,

    /// Show the logged-in profile
    Whoami,

    /// List gym machines
    Machines,

    /// Log a machine session
    Log {
        /// Machine id or name (e.g. 9, "leg press")
        machine: String,

        /// Weight in kg
        weight: f64,

        /// Repetitions
        reps: u32,

        #[arg(short, long, default_value = "medium")]
        difficulty: Difficulty,

        /// Session date (YYYY-MM-DD or RFC 3339), defaults to now
        #[arg(long)]
        date: Option<String>,
    },

    /// List session history
    History {
        /// Number of records to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Delete a session by id
    Delete { id: String },

    /// Show per-machine progress
    Progress {
        /// Include machines never used
        #[arg(short, long)]
        all: bool,
    },

    /// Show weight lifted per week
    Weekly,
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Create a profile
    Create { name: String, code: String },
    /// List profiles
    List,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.memory {
        let store = MemoryStore::new();
        run(cli.command, Tracker::new(&store, &store))
    } else {
        let db = Database::open(&cli.db)?;
        run(cli.command, Tracker::new(&db, &db))
    }
}

fn run<D: DocumentStore, K: KeyValueStore>(command: Option<Commands>, tracker: Tracker<D, K>) -> Result<()> {
    match command {
        Some(Commands::Profile { action: ProfileAction::Create { name, code } }) => {
            let profile = tracker.create_profile(&name, &code)?;
            println!("Created profile: {}", profile.name);
        }

        Some(Commands::Profile { action: ProfileAction::List }) => {
            let current = tracker.current_profile()?.map(|p| p.id);
            for p in tracker.profiles()? {
                let marker = if current.as_deref() == Some(p.id.as_str()) { "*" } else { " " };
                println!("{} {:20} since {}", marker, p.name, p.created_at.format("%Y-%m-%d"));
            }
        }

        Some(Commands::Login { name, code }) => {
            let profile = tracker.login(&name, &code)?;
            println!("Logged in as {}", profile.name);
        }

        Some(Commands::Logout) => {
            tracker.logout()?;
            println!("Logged out");
        }

        Some(Commands::Whoami) => match tracker.current_profile()? {
            Some(p) => println!("{}", p.name),
            None => println!("Not logged in"),
        },

        Some(Commands::Machines) => {
            for m in all_machines() {
                println!("{:>3} {} {:20} {}", m.id, m.category.emoji(), m.name, m.category.name());
            }
        }

        Some(Commands::Log { machine, weight, reps, difficulty, date }) => {
            let machine = lookup(&machine).ok_or_else(|| anyhow!("Unknown machine: {}", machine))?;
            let date = match date {
                Some(d) => parse_date(&d).with_context(|| format!("Invalid date: {}", d))?,
                None => Utc::now(),
            };
            let session = tracker.log_session(NewSession {
                machine_id: machine.id,
                weight,
                reps,
                date,
                difficulty,
            })?;
            println!("Logged: {} - {}kg x{} (id: {})", machine.name, weight, reps, session.id);
        }

        Some(Commands::History { limit }) => {
            let user = require_login(&tracker)?;
            println!("Recent sessions:");
            println!("{:-<72}", "");
            for s in tracker.sessions_for(&user)?.iter().take(limit) {
                let name = find_machine(s.machine_id).map(|m| m.name).unwrap_or("?");
                println!(
                    "{} | {:20} | {:>6.1}kg x{:<3} | {:6} | {}",
                    s.date.format("%Y-%m-%d %H:%M"),
                    name,
                    s.weight,
                    s.reps,
                    s.difficulty.label(),
                    s.id
                );
            }
        }

        Some(Commands::Delete { id }) => {
            tracker.delete_session(&id)?;
            println!("Deleted {}", id);
        }

        Some(Commands::Progress { all }) => {
            let user = require_login(&tracker)?;
            let progress = if all {
                tracker.progress(&user)?
            } else {
                tracked_progress(all_machines(), &tracker.sessions_for(&user)?)
            };

            println!("Machine progress");
            println!("{:-<56}", "");
            for p in progress {
                println!(
                    "{:20} {:10} {:>8} {:>8}  {}",
                    p.name,
                    p.category.name(),
                    fmt_weight(p.last_weight),
                    fmt_weight(p.prev_weight),
                    p.change.arrow()
                );
            }
        }

        Some(Commands::Weekly) => {
            let user = tracker.current_profile()?.map(|p| p.id);
            let weeks = tracker.weekly_volume(user.as_deref())?;
            if weeks.is_empty() {
                println!("No data");
            }
            for w in weeks {
                println!("{}  {:>10.1} kg", w.week_key(), w.total);
            }
        }

        Some(Commands::Tui) | None => {
            let mut app = App::new(tracker)?;
            app.run()?;
        }
    }

    Ok(())
}

fn require_login<D: DocumentStore, K: KeyValueStore>(tracker: &Tracker<D, K>) -> Result<String> {
    tracker
        .current_profile()?
        .map(|p| p.id)
        .ok_or_else(|| anyhow!("Not logged in (use `gymtrack login <name> <code>`)"))
}

fn fmt_weight(w: Option<f64>) -> String {
    w.map(|w| format!("{:.1}kg", w)).unwrap_or_else(|| "-".to_string())
}
