//! Custom error types for the fleet manager
//!
//! Errors raised by API-facing engine operations reach the caller as
//! `EngineError`. Errors raised inside a task run are turned into a
//! terminal history entry instead.

use std::fmt;
use std::time::Duration;

/// Main error type for the execution engine
#[derive(Debug)]
pub enum EngineError {
    /// Malformed create-task request
    Validation(ValidationError),

    /// The fleet control agent exited non-zero
    AgentExecution { profile: String, message: String },

    /// Rolling execution did not observe a healthy target
    Stability(StabilityFailure),

    /// Operation on an unknown task id
    NotFound { task_id: String },

    /// Durable state could not be read or written
    Persistence { operation: String, reason: String },
}

/// Validation error variants
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// No target servers were given
    EmptyTargets,

    /// Action is not one of start, stop, restart
    UnknownAction { action: String },

    /// Hour or minute out of range, or unparseable time of day
    InvalidTime { input: String },

    /// Schedule expression could not be read as `<min> <hour> * * *`
    InvalidSchedule { input: String },
}

/// Stability protocol failures during rolling execution
#[derive(Debug, Clone, PartialEq)]
pub enum StabilityFailure {
    /// Target never reported RUNNING within the reach ceiling
    NeverReachedRunning { server: String, waited: Duration },

    /// Target reached RUNNING, then regressed inside the stability window
    CrashedDuringWindow {
        server: String,
        status: String,
        window: Duration,
    },
}

impl EngineError {
    pub fn persistence(operation: &str, reason: impl fmt::Display) -> Self {
        EngineError::Persistence {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, EngineError::Validation(_))
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Validation(e) => write!(f, "Validation error: {}", e),
            EngineError::AgentExecution { profile, message } => {
                write!(f, "Agent error (profile {}): {}", profile, message)
            }
            EngineError::Stability(e) => write!(f, "{}", e),
            EngineError::NotFound { task_id } => write!(f, "Job {} not found", task_id),
            EngineError::Persistence { operation, reason } => {
                write!(f, "Persistence error during {}: {}", operation, reason)
            }
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyTargets => write!(f, "at least one target server is required"),
            ValidationError::UnknownAction { action } => {
                write!(f, "unknown action '{}' (expected start, stop or restart)", action)
            }
            ValidationError::InvalidTime { input } => {
                write!(f, "invalid time of day '{}'", input)
            }
            ValidationError::InvalidSchedule { input } => {
                write!(f, "invalid schedule '{}' (expected '<min> <hour> * * *')", input)
            }
        }
    }
}

impl fmt::Display for StabilityFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StabilityFailure::NeverReachedRunning { server, waited } => {
                write!(
                    f,
                    "Stability Failure: {} did not reach RUNNING within {:?}",
                    server, waited
                )
            }
            StabilityFailure::CrashedDuringWindow {
                server,
                status,
                window,
            } => {
                write!(
                    f,
                    "Stability Failure: {} crashed (status: {}) during {:?} stability window, aborting job",
                    server, status, window
                )
            }
        }
    }
}

impl std::error::Error for EngineError {}
impl std::error::Error for ValidationError {}
impl std::error::Error for StabilityFailure {}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Validation(err)
    }
}

impl From<StabilityFailure> for EngineError {
    fn from(err: StabilityFailure) -> Self {
        EngineError::Stability(err)
    }
}

// Database and scheduler plumbing reports through anyhow
impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        EngineError::Persistence {
            operation: "storage".to_string(),
            reason: err.to_string(),
        }
    }
}
