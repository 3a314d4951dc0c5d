//! Tracker service - profiles, login and session logging on top of injected stores

use anyhow::{Result, bail};
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::machines::{MachineId, all_machines, find_machine};
use crate::models::{NewSession, Profile, Session};
use crate::progress::{self, MachineProgress, WeeklyVolume};
use crate::store::{DocumentStore, Filter, KeyValueStore, decode_all, to_body};

pub const PROFILES: &str = "profiles";
pub const SESSIONS: &str = "sessions";

/// Key holding the logged-in profile id
const CURRENT_USER_KEY: &str = "current_user";

/// bcrypt cost for login codes
pub const DEFAULT_HASH_COST: u32 = 10;

#[derive(Error, Debug, PartialEq)]
pub enum ProfileError {
    #[error("Profile name must not be empty")]
    EmptyName,
    #[error("Profile '{0}' already exists")]
    NameTaken(String),
    #[error("Login code must be exactly 4 digits")]
    BadCodeFormat,
    #[error("No profile named '{0}'")]
    NotFound(String),
    #[error("Wrong login code")]
    InvalidCode,
    #[error("Not logged in")]
    NotLoggedIn,
}

#[derive(Error, Debug, PartialEq)]
pub enum SessionError {
    #[error("Weight must be a positive number of kg, got {0}")]
    BadWeight(f64),
    #[error("Reps must be positive")]
    BadReps,
    #[error("Unknown machine id {0}")]
    UnknownMachine(MachineId),
    #[error("No session {0}")]
    NotFound(String),
}

fn valid_code(code: &str) -> bool {
    code.len() == 4 && code.chars().all(|c| c.is_ascii_digit())
}

pub struct Tracker<D, K> {
    docs: D,
    kv: K,
    hash_cost: u32,
}

impl<D: DocumentStore, K: KeyValueStore> Tracker<D, K> {
    pub fn new(docs: D, kv: K) -> Self {
        Self {
            docs,
            kv,
            hash_cost: DEFAULT_HASH_COST,
        }
    }

    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    /// Create a profile. The code is stored only as a bcrypt hash.
    pub fn create_profile(&self, name: &str, code: &str) -> Result<Profile> {
        let name = name.trim();
        if name.is_empty() {
            bail!(ProfileError::EmptyName);
        }
        if !valid_code(code) {
            bail!(ProfileError::BadCodeFormat);
        }
        if self.find_profile(name)?.is_some() {
            bail!(ProfileError::NameTaken(name.to_string()));
        }

        let mut profile = Profile {
            id: String::new(),
            name: name.to_string(),
            code_hash: bcrypt::hash(code, self.hash_cost)?,
            created_at: Utc::now(),
        };
        profile.id = self.docs.insert(PROFILES, to_body(&profile)?)?;
        info!("Created profile {} ({})", profile.name, profile.id);
        Ok(profile)
    }

    /// All profiles sorted by name
    pub fn profiles(&self) -> Result<Vec<Profile>> {
        let mut profiles: Vec<Profile> = decode_all(PROFILES, self.docs.find(PROFILES, &[])?);
        profiles.sort_by_key(|p| p.name.to_lowercase());
        Ok(profiles)
    }

    /// Case-insensitive lookup by name
    fn find_profile(&self, name: &str) -> Result<Option<Profile>> {
        let wanted = name.trim().to_lowercase();
        Ok(self
            .profiles()?
            .into_iter()
            .find(|p| p.name.to_lowercase() == wanted))
    }

    /// Check the code and remember the profile as current
    pub fn login(&self, name: &str, code: &str) -> Result<Profile> {
        let Some(profile) = self.find_profile(name)? else {
            bail!(ProfileError::NotFound(name.trim().to_string()));
        };
        if !valid_code(code) || !bcrypt::verify(code, &profile.code_hash)? {
            info!("Failed login for {}", profile.name);
            bail!(ProfileError::InvalidCode);
        }

        self.kv.set(CURRENT_USER_KEY, &profile.id)?;
        info!("Logged in as {}", profile.name);
        Ok(profile)
    }

    pub fn logout(&self) -> Result<()> {
        self.kv.remove(CURRENT_USER_KEY)
    }

    /// Logged-in profile, if it still exists
    pub fn current_profile(&self) -> Result<Option<Profile>> {
        let Some(id) = self.kv.get(CURRENT_USER_KEY)? else {
            return Ok(None);
        };
        let profile = match self.docs.get(PROFILES, &id)? {
            Some(doc) => match doc.decode() {
                Ok(profile) => Some(profile),
                Err(e) => {
                    warn!("Unreadable current profile {}: {}", id, e);
                    None
                }
            },
            None => None,
        };
        Ok(profile)
    }

    fn require_profile(&self) -> Result<Profile> {
        match self.current_profile()? {
            Some(p) => Ok(p),
            None => bail!(ProfileError::NotLoggedIn),
        }
    }

    /// Validate and store a session for the logged-in profile
    pub fn log_session(&self, new: NewSession) -> Result<Session> {
        let profile = self.require_profile()?;

        if !(new.weight.is_finite() && new.weight > 0.0) {
            bail!(SessionError::BadWeight(new.weight));
        }
        if new.reps == 0 {
            bail!(SessionError::BadReps);
        }
        if find_machine(new.machine_id).is_none() {
            bail!(SessionError::UnknownMachine(new.machine_id));
        }

        let mut session = Session {
            id: String::new(),
            user_id: profile.id,
            machine_id: new.machine_id,
            weight: new.weight,
            reps: new.reps,
            date: new.date,
            difficulty: new.difficulty,
        };
        session.id = self.docs.insert(SESSIONS, to_body(&session)?)?;
        debug!(
            "Logged session {} machine={} {}kg x{}",
            session.id, session.machine_id, session.weight, session.reps
        );
        Ok(session)
    }

    /// A user's sessions, most recent first
    pub fn sessions_for(&self, user_id: &str) -> Result<Vec<Session>> {
        let docs = self.docs.find(SESSIONS, &[Filter::equals("user_id", user_id)])?;
        let mut sessions: Vec<Session> = decode_all(SESSIONS, docs);
        sessions.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(sessions)
    }

    /// Delete one of the logged-in profile's sessions
    pub fn delete_session(&self, id: &str) -> Result<()> {
        let profile = self.require_profile()?;

        let owned = self
            .docs
            .get(SESSIONS, id)?
            .is_some_and(|doc| doc.body.get("user_id").and_then(|v| v.as_str()) == Some(profile.id.as_str()));
        if !owned || !self.docs.delete(SESSIONS, id)? {
            bail!(SessionError::NotFound(id.to_string()));
        }

        info!("Deleted session {}", id);
        Ok(())
    }

    /// Trend for every catalog machine
    pub fn progress(&self, user_id: &str) -> Result<Vec<MachineProgress>> {
        let sessions = self.sessions_for(user_id)?;
        Ok(progress::machine_progress(all_machines(), &sessions))
    }

    /// Weekly lifted volume; no user means no data
    pub fn weekly_volume(&self, user_id: Option<&str>) -> Result<Vec<WeeklyVolume>> {
        let Some(user_id) = user_id.filter(|id| !id.is_empty()) else {
            return Ok(Vec::new());
        };
        let sessions = self.sessions_for(user_id)?;
        Ok(progress::weekly_volume_for_user(Some(user_id), &sessions))
    }
}
