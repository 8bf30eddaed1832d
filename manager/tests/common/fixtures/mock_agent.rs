//! Scriptable fleet agent that never spawns a process
//!
//! Every server has a queue of statuses. Each status query pops one entry
//! from every queue holding more than one; the last entry sticks. An apply
//! call can swap in a new queue for a target, which is how a member is made
//! to come up (or crash) after being started.

use futures::future::{BoxFuture, FutureExt};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use fleet_manager::agent::{FleetAgent, ImmediateAction, ServerStatusView};
use fleet_manager::errors::EngineError;
use fleet_manager::scheduler::Action;

#[derive(Debug, Clone, PartialEq)]
pub struct ApplyCall {
    pub action: Action,
    pub targets: Vec<String>,
    pub profile: String,
}

#[derive(Default)]
pub struct MockFleetAgent {
    statuses: Mutex<Vec<(String, VecDeque<String>)>>,
    after_apply: Mutex<HashMap<String, Vec<String>>>,
    failing: Mutex<HashSet<String>>,
    applied: Mutex<Vec<ApplyCall>>,
    status_runs: Mutex<Vec<Vec<String>>>,
    status_queries: Mutex<usize>,
}

impl MockFleetAgent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixed status for `server`
    pub fn with_status(self, server: &str, status: &str) -> Self {
        self.set_statuses(server, &[status]);
        self
    }

    /// Status sequence reported by successive queries
    pub fn with_statuses(self, server: &str, statuses: &[&str]) -> Self {
        self.set_statuses(server, statuses);
        self
    }

    /// Replace `server`'s status sequence once an action is applied to it
    pub fn after_apply(self, server: &str, statuses: &[&str]) -> Self {
        self.after_apply.lock().unwrap().insert(
            server.to_string(),
            statuses.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    /// Make any apply call touching `server` fail
    pub fn failing_on(self, server: &str) -> Self {
        self.failing.lock().unwrap().insert(server.to_string());
        self
    }

    pub fn apply_calls(&self) -> Vec<ApplyCall> {
        self.applied.lock().unwrap().clone()
    }

    /// Targets of every immediate `status` verb
    pub fn status_runs(&self) -> Vec<Vec<String>> {
        self.status_runs.lock().unwrap().clone()
    }

    pub fn status_queries(&self) -> usize {
        *self.status_queries.lock().unwrap()
    }

    fn set_statuses(&self, server: &str, statuses: &[&str]) {
        let queue: VecDeque<String> = statuses.iter().map(|s| s.to_string()).collect();
        let mut all = self.statuses.lock().unwrap();
        match all.iter_mut().find(|(name, _)| name == server) {
            Some((_, existing)) => *existing = queue,
            None => all.push((server.to_string(), queue)),
        }
    }

    fn snapshot(&self) -> ServerStatusView {
        *self.status_queries.lock().unwrap() += 1;

        let mut listing = String::new();
        let mut all = self.statuses.lock().unwrap();
        for (server, queue) in all.iter_mut() {
            let status = if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            };
            if let Some(status) = status {
                listing.push_str(&format!("{} {}\n", server, status));
            }
        }
        ServerStatusView::from_listing(&listing)
    }

    fn record_apply(
        &self,
        action: Action,
        targets: &[String],
        profile: &str,
    ) -> Result<String, EngineError> {
        self.applied.lock().unwrap().push(ApplyCall {
            action,
            targets: targets.to_vec(),
            profile: profile.to_string(),
        });

        let failing = self.failing.lock().unwrap();
        if let Some(target) = targets.iter().find(|t| failing.contains(*t)) {
            return Err(EngineError::AgentExecution {
                profile: profile.to_string(),
                message: format!("Script error: {} refused {}", target, action),
            });
        }
        drop(failing);

        let replacements = self.after_apply.lock().unwrap();
        for target in targets {
            if let Some(statuses) = replacements.get(target) {
                let statuses: Vec<&str> = statuses.iter().map(String::as_str).collect();
                self.set_statuses(target, &statuses);
            }
        }

        Ok(format!("{} {}", action, targets.join(",")))
    }
}

impl FleetAgent for MockFleetAgent {
    fn query_status<'a>(&'a self, _profile: &'a str) -> BoxFuture<'a, ServerStatusView> {
        let view = self.snapshot();
        async move { view }.boxed()
    }

    fn apply_action<'a>(
        &'a self,
        action: Action,
        targets: &'a [String],
        profile: &'a str,
    ) -> BoxFuture<'a, Result<String, EngineError>> {
        let result = self.record_apply(action, targets, profile);
        async move { result }.boxed()
    }

    fn apply_immediate<'a>(
        &'a self,
        action: ImmediateAction,
        targets: &'a [String],
        profile: &'a str,
    ) -> BoxFuture<'a, Result<String, EngineError>> {
        let result = match action {
            ImmediateAction::Lifecycle(action) => self.record_apply(action, targets, profile),
            ImmediateAction::Status => {
                self.status_runs.lock().unwrap().push(targets.to_vec());
                Ok(format!("status {}", targets.join(",")))
            }
        };
        async move { result }.boxed()
    }
}
