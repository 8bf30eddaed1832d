//! Cluster safety gating and rolling execution
//!
//! Before touching a clustered member, at least one of its peers must be
//! RUNNING. Cluster-aware tasks then act on one member at a time; after a
//! start or restart the member has to reach RUNNING and stay there for the
//! stability window before the roll moves on.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::agent::FleetAgent;
use crate::constants::rolling;
use crate::errors::{EngineError, StabilityFailure};
use crate::scheduler::ScheduledTask;
use crate::topology::ClusterTopology;

/// Poll cadence of the stability protocol
#[derive(Debug, Clone, PartialEq)]
pub struct RollingPolicy {
    pub poll_interval: Duration,
    pub reach_attempts: u32,
    pub stability_polls: u32,
}

impl Default for RollingPolicy {
    fn default() -> Self {
        Self {
            poll_interval: rolling::POLL_INTERVAL,
            reach_attempts: rolling::REACH_ATTEMPTS,
            stability_polls: rolling::STABILITY_POLLS,
        }
    }
}

impl RollingPolicy {
    pub fn reach_ceiling(&self) -> Duration {
        self.poll_interval * self.reach_attempts
    }

    pub fn stability_window(&self) -> Duration {
        self.poll_interval * self.stability_polls
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SafetyResolution {
    pub final_targets: Vec<String>,
    /// `server [Peers: peer(STATUS), ...]`
    pub skipped: Vec<String>,
}

/// Split targets into those safe to act on and those whose cluster would
/// be left without a RUNNING member. Peer checks stop at the first peer
/// found running.
pub async fn resolve_targets(
    agent: &dyn FleetAgent,
    topology: &ClusterTopology,
    task: &ScheduledTask,
) -> SafetyResolution {
    let mut resolution = SafetyResolution::default();

    for server in &task.targets {
        let peers = topology.lookup(server);
        if peers.is_empty() {
            resolution.final_targets.push(server.clone());
            continue;
        }

        let mut observed = Vec::with_capacity(peers.len());
        let mut can_proceed = false;
        for peer in &peers {
            let view = agent.query_status(&task.profile).await;
            let status = view.status_of(peer);
            observed.push(format!("{}({})", peer, status));
            if status.contains(rolling::RUNNING_TOKEN) {
                can_proceed = true;
                break;
            }
        }

        if can_proceed {
            resolution.final_targets.push(server.clone());
        } else {
            warn!("Cluster safety: skipping {} (peers: {})", server, observed.join(", "));
            resolution
                .skipped
                .push(format!("{} [Peers: {}]", server, observed.join(", ")));
        }
    }

    resolution
}

/// Act on `targets` one at a time, in order. Targets finished before an
/// abort are pushed to `completed` and are not rolled back.
pub async fn roll_out(
    agent: &dyn FleetAgent,
    policy: &RollingPolicy,
    task: &ScheduledTask,
    targets: &[String],
    completed: &mut Vec<String>,
) -> Result<(), EngineError> {
    for target in targets {
        info!("Rolling task: executing {} on {}", task.action, target);
        agent
            .apply_action(task.action, std::slice::from_ref(target), &task.profile)
            .await?;

        if task.action.requires_stability_check() {
            await_stability(agent, policy, target, &task.profile).await?;
            info!("Rolling task: {} confirmed stable", target);
        }

        completed.push(target.clone());
    }

    Ok(())
}

/// Wait for `target` to report RUNNING, then require it to keep doing so
/// for every poll of the stability window.
pub async fn await_stability(
    agent: &dyn FleetAgent,
    policy: &RollingPolicy,
    target: &str,
    profile: &str,
) -> Result<(), StabilityFailure> {
    let mut reached = false;
    for attempt in 1..=policy.reach_attempts {
        sleep(policy.poll_interval).await;
        if agent.query_status(profile).await.is_running(target) {
            debug!("{} reached RUNNING after {} polls", target, attempt);
            reached = true;
            break;
        }
    }

    if !reached {
        return Err(StabilityFailure::NeverReachedRunning {
            server: target.to_string(),
            waited: policy.reach_ceiling(),
        });
    }

    info!(
        "Rolling task: {} reached RUNNING, holding {:?} stability window",
        target,
        policy.stability_window()
    );

    for _ in 0..policy.stability_polls {
        sleep(policy.poll_interval).await;
        let view = agent.query_status(profile).await;
        let status = view.status_of(target);
        if !status.contains(rolling::RUNNING_TOKEN) {
            return Err(StabilityFailure::CrashedDuringWindow {
                server: target.to_string(),
                status: status.to_string(),
                window: policy.stability_window(),
            });
        }
    }

    Ok(())
}
