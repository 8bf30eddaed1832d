//! Fleet control agent call-outs
//!
//! The agent is an external executable that knows how to list member
//! statuses on a host and how to start, stop or restart members there.
//! The engine only sees it through the `FleetAgent` trait.
//!
//! # Contract
//!
//! ```text
//! status:  <shell> <status_script> IP PORT USER PASS
//!          stdout: one "<server> <status> ..." line per member, exit 0
//! apply:   <shell> <action_script> ACTION A,B,C IP PORT USER PASS
//!          exit 0 on success, stderr carries the error otherwise
//! ```
//!
//! No retries happen at this layer.

pub mod client;
pub use client::AgentClient;

use futures::future::BoxFuture;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::constants::rolling::{RUNNING_TOKEN, UNKNOWN_STATUS};
use crate::errors::{EngineError, ValidationError};
use crate::scheduler::Action;

pub trait FleetAgent: Send + Sync {
    /// Status of every member on the profile's host. Never fails; an
    /// unreachable host yields an empty view.
    fn query_status<'a>(&'a self, profile: &'a str) -> BoxFuture<'a, ServerStatusView>;

    /// Apply `action` to all `targets` in one agent invocation
    fn apply_action<'a>(
        &'a self,
        action: Action,
        targets: &'a [String],
        profile: &'a str,
    ) -> BoxFuture<'a, Result<String, EngineError>>;

    /// Run an operator-requested verb right away. Lifecycle verbs behave like
    /// `apply_action`; `status` is passed through to the action script.
    fn apply_immediate<'a>(
        &'a self,
        action: ImmediateAction,
        targets: &'a [String],
        profile: &'a str,
    ) -> BoxFuture<'a, Result<String, EngineError>>;
}

/// Verbs accepted for immediate execution. Only lifecycle actions can be
/// scheduled.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ImmediateAction {
    Lifecycle(Action),
    Status,
}

impl ImmediateAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImmediateAction::Lifecycle(action) => action.as_str(),
            ImmediateAction::Status => "status",
        }
    }
}

impl fmt::Display for ImmediateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImmediateAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("status") {
            return Ok(ImmediateAction::Status);
        }
        s.parse::<Action>().map(ImmediateAction::Lifecycle)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ServerStatus {
    pub name: String,
    pub status: String,
}

/// Normalized status listing, in the order the agent reported it
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ServerStatusView {
    servers: Vec<ServerStatus>,
}

impl ServerStatusView {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse agent output. Lines with fewer than two tokens are ignored.
    pub fn from_listing(output: &str) -> Self {
        let servers = output
            .lines()
            .filter_map(|line| {
                let mut parts = line.split_whitespace();
                let name = parts.next()?;
                let status = parts.next()?;
                Some(ServerStatus {
                    name: name.to_string(),
                    status: normalize_status(status),
                })
            })
            .collect();

        Self { servers }
    }

    /// First reported status for `server`, or UNKNOWN when absent
    pub fn status_of(&self, server: &str) -> &str {
        self.servers
            .iter()
            .find(|s| s.name == server)
            .map(|s| s.status.as_str())
            .unwrap_or(UNKNOWN_STATUS)
    }

    pub fn is_running(&self, server: &str) -> bool {
        self.status_of(server).contains(RUNNING_TOKEN)
    }

    pub fn servers(&self) -> &[ServerStatus] {
        &self.servers
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

/// `RUNNING(pid=5)` -> `RUNNING`
pub fn normalize_status(raw: &str) -> String {
    let token = raw.split('(').next().unwrap_or("").trim();
    if token.is_empty() {
        UNKNOWN_STATUS.to_string()
    } else {
        token.to_string()
    }
}
