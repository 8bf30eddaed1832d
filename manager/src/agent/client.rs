use futures::future::{BoxFuture, FutureExt};
use std::process::Output;
use std::sync::Arc;
use tokio::process::Command as AsyncCommand;
use tracing::{debug, info, warn};

use super::{FleetAgent, ImmediateAction, ServerStatusView};
use crate::config::{Config, ProfileConfig};
use crate::errors::EngineError;
use crate::scheduler::Action;

/// Spawns the configured agent scripts, one process per call
pub struct AgentClient {
    config: Arc<Config>,
}

impl AgentClient {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    fn credential_args(profile: &ProfileConfig) -> [String; 4] {
        [
            profile.ip.clone(),
            profile.port.to_string(),
            profile.user.clone(),
            profile.password.clone(),
        ]
    }

    async fn run_script(&self, script: &str, args: &[String]) -> std::io::Result<Output> {
        let agent = &self.config.agent;
        AsyncCommand::new(&agent.shell)
            .arg(script)
            .args(args)
            .current_dir(&agent.working_dir)
            .kill_on_drop(true)
            .output()
            .await
    }

    pub async fn query_status(&self, profile_key: &str) -> ServerStatusView {
        let Some(profile) = self.config.profile(profile_key) else {
            warn!("Status query for unknown profile '{}'", profile_key);
            return ServerStatusView::empty();
        };

        let script = &self.config.agent.status_script;
        debug!("Querying member status via profile {} ({}:{})", profile_key, profile.ip, profile.port);

        let output = match self.run_script(script, &Self::credential_args(profile)).await {
            Ok(output) => output,
            Err(e) => {
                warn!("Failed to spawn status script {}: {}", script, e);
                return ServerStatusView::empty();
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                "Status script exited with {} for profile {}: {}",
                output.status,
                profile_key,
                stderr.trim()
            );
            return ServerStatusView::empty();
        }

        ServerStatusView::from_listing(&String::from_utf8_lossy(&output.stdout))
    }

    pub async fn apply_action(
        &self,
        action: Action,
        targets: &[String],
        profile_key: &str,
    ) -> Result<String, EngineError> {
        self.run_action_script(action.as_str(), targets, profile_key).await
    }

    pub async fn apply_immediate(
        &self,
        action: ImmediateAction,
        targets: &[String],
        profile_key: &str,
    ) -> Result<String, EngineError> {
        self.run_action_script(action.as_str(), targets, profile_key).await
    }

    async fn run_action_script(
        &self,
        verb: &str,
        targets: &[String],
        profile_key: &str,
    ) -> Result<String, EngineError> {
        let agent_error = |message: String| EngineError::AgentExecution {
            profile: profile_key.to_string(),
            message,
        };

        let profile = self
            .config
            .profile(profile_key)
            .ok_or_else(|| agent_error(format!("profile '{}' is not configured", profile_key)))?;

        let server_args = targets.join(",");
        info!("Executing action: {} on [{}] via profile {}", verb, server_args, profile_key);

        let mut args = vec![verb.to_string(), server_args];
        args.extend(Self::credential_args(profile));

        let script = &self.config.agent.action_script;
        let output = self
            .run_script(script, &args)
            .await
            .map_err(|e| agent_error(format!("failed to spawn {}: {}", script, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(agent_error(format!("Script error: {}", stderr)));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl FleetAgent for AgentClient {
    fn query_status<'a>(&'a self, profile: &'a str) -> BoxFuture<'a, ServerStatusView> {
        AgentClient::query_status(self, profile).boxed()
    }

    fn apply_action<'a>(
        &'a self,
        action: Action,
        targets: &'a [String],
        profile: &'a str,
    ) -> BoxFuture<'a, Result<String, EngineError>> {
        AgentClient::apply_action(self, action, targets, profile).boxed()
    }

    fn apply_immediate<'a>(
        &'a self,
        action: ImmediateAction,
        targets: &'a [String],
        profile: &'a str,
    ) -> BoxFuture<'a, Result<String, EngineError>> {
        AgentClient::apply_immediate(self, action, targets, profile).boxed()
    }
}
