//! Central repository for timing constants, limits and defaults
//!
//! Constants are grouped by category so the rolling protocol and the
//! history cap have a single source of truth.

use std::time::Duration;

/// Rolling execution and stability protocol
pub mod rolling {
    use super::Duration;

    /// Pause between consecutive status polls of a target
    pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

    /// Polls allowed for a target to first report RUNNING (60s ceiling)
    pub const REACH_ATTEMPTS: u32 = 30;

    /// Polls a target must stay RUNNING after reaching it (10s window)
    pub const STABILITY_POLLS: u32 = 5;

    /// Status token a healthy member reports
    pub const RUNNING_TOKEN: &str = "RUNNING";

    /// Status reported for members missing from a status listing
    pub const UNKNOWN_STATUS: &str = "UNKNOWN";
}

/// History log limits
pub mod history {
    /// Maximum entries retained, newest first
    pub const MAX_ENTRIES: i64 = 100;

    /// Local wall-clock format used when showing times to operators
    pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
}

/// Default configuration values
pub mod defaults {
    pub const HOST: &str = "0.0.0.0";

    pub const PORT: u16 = 8000;

    pub const DATABASE_PATH: &str = "data/fleet.db";

    /// Profile used when a request names none
    pub const PROFILE: &str = "container";

    pub const AGENT_SHELL: &str = "bash";

    pub const STATUS_SCRIPT: &str = "list_servers.sh";

    pub const ACTION_SCRIPT: &str = "manage_container.sh";

    pub const STATIC_DIR: &str = "static";
}
