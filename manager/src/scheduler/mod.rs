//! One-shot deferred lifecycle actions
//!
//! A scheduled task names an action, its target servers and a single fire
//! instant. Requests carry an hour and minute of day; the task fires at the
//! next matching local wall-clock time and is never re-armed afterwards.
//!
//! # Accepted time forms
//!
//! ```text
//! "02:30"        HH:MM
//! "30 2 * * *"   <min> <hour> * * *  (only minute and hour are read)
//! ```

pub mod timers;
pub use timers::TaskScheduler;

use crate::errors::ValidationError;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Start,
    Stop,
    Restart,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Stop => "stop",
            Action::Restart => "restart",
        }
    }

    /// Start and restart must be followed by the stability protocol
    pub fn requires_stability_check(&self) -> bool {
        matches!(self, Action::Start | Action::Restart)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(Action::Start),
            "stop" => Ok(Action::Stop),
            "restart" => Ok(Action::Restart),
            _ => Err(ValidationError::UnknownAction {
                action: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeOfDay {
    hour: u32,
    minute: u32,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Result<Self, ValidationError> {
        if hour > 23 || minute > 59 {
            return Err(ValidationError::InvalidTime {
                input: format!("{}:{:02}", hour, minute),
            });
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// Reads the simplified cron form `<min> <hour> * * *`
    pub fn from_cron(expr: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidSchedule {
            input: expr.to_string(),
        };

        let mut parts = expr.split_whitespace();
        let minute = parts.next().and_then(|p| p.parse::<u32>().ok()).ok_or_else(invalid)?;
        let hour = parts.next().and_then(|p| p.parse::<u32>().ok()).ok_or_else(invalid)?;

        Self::new(hour, minute)
    }

    /// Next instant strictly after `now` whose local wall-clock time matches.
    /// Today if the time has not yet passed, otherwise tomorrow. Days where
    /// the time does not exist locally (DST gaps) are skipped.
    pub fn next_occurrence<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Utc> {
        let tz = now.timezone();
        let mut date = now.date_naive();

        for _ in 0..3 {
            let candidate = date
                .and_hms_opt(self.hour, self.minute, 0)
                .and_then(|naive| tz.from_local_datetime(&naive).earliest());

            if let Some(candidate) = candidate {
                if candidate > *now {
                    return candidate.with_timezone(&Utc);
                }
            }

            date = match date.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }

        now.with_timezone(&Utc)
    }
}

impl FromStr for TimeOfDay {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.contains(char::is_whitespace) {
            return Self::from_cron(trimmed);
        }

        let invalid = || ValidationError::InvalidTime {
            input: s.to_string(),
        };
        let (hour, minute) = trimmed.split_once(':').ok_or_else(invalid)?;
        let hour = hour.parse::<u32>().map_err(|_| invalid())?;
        let minute = minute.parse::<u32>().map_err(|_| invalid())?;

        Self::new(hour, minute)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// A one-shot deferred action, persisted before it is armed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduledTask {
    pub id: String,
    pub action: Action,
    pub targets: Vec<String>,
    pub fire_at: DateTime<Utc>,
    pub cluster_aware: bool,
    pub profile: String,
}

impl ScheduledTask {
    pub fn new(
        action: Action,
        targets: Vec<String>,
        fire_at: DateTime<Utc>,
        cluster_aware: bool,
        profile: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            action,
            targets,
            fire_at,
            cluster_aware,
            profile,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.fire_at < now
    }
}
