// File: manager/src/services/execution_engine.rs
//
// Deferred execution engine: creates one-shot tasks, and at fire time runs
// cluster safety gating, dispatch and stability verification
//
use crate::agent::FleetAgent;
use crate::database::{Database, HistoryEntry, TaskStatus};
use crate::errors::{EngineError, ValidationError};
use crate::scheduler::{Action, ScheduledTask, TaskScheduler, TimeOfDay};
use crate::services::rolling::{self, RollingPolicy, SafetyResolution};
use crate::topology::{ClusterMap, ClusterTopology};
use anyhow::Result;
use chrono::Local;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

pub struct ExecutionEngine {
    database: Arc<Database>,
    scheduler: TaskScheduler,
    topology: Arc<ClusterTopology>,
    agent: Arc<dyn FleetAgent>,
    policy: RollingPolicy,
}

impl ExecutionEngine {
    pub async fn new(
        database: Arc<Database>,
        topology: Arc<ClusterTopology>,
        agent: Arc<dyn FleetAgent>,
        policy: RollingPolicy,
    ) -> Result<Arc<Self>> {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        let scheduler = TaskScheduler::new(database.clone(), fired_tx).await?;

        let engine = Arc::new(Self {
            database,
            scheduler,
            topology,
            agent,
            policy,
        });

        Self::spawn_dispatcher(Arc::downgrade(&engine), fired_rx);
        Ok(engine)
    }

    /// Every fired task runs on its own tokio task so stability waits never
    /// hold up the timer facility or other runs.
    fn spawn_dispatcher(engine: Weak<Self>, mut fired_rx: mpsc::UnboundedReceiver<ScheduledTask>) {
        tokio::spawn(async move {
            while let Some(task) = fired_rx.recv().await {
                let Some(engine) = engine.upgrade() else {
                    warn!("Execution engine dropped, discarding fired job {}", task.id);
                    break;
                };
                tokio::spawn(async move {
                    engine.run_task(task).await;
                });
            }
            debug!("Dispatcher stopped");
        });
    }

    /// Start timers and restore persisted jobs
    pub async fn start(&self) -> Result<usize> {
        self.scheduler.start().await
    }

    /// Schedule `action` for the next local occurrence of `time`
    pub async fn create_task(
        &self,
        action: Action,
        targets: Vec<String>,
        time: TimeOfDay,
        cluster_aware: bool,
        profile: &str,
    ) -> Result<String, EngineError> {
        let fire_at = time.next_occurrence(&Local::now());
        let task = ScheduledTask::new(action, targets, fire_at, cluster_aware, profile.to_string());
        self.schedule_task(task).await
    }

    /// Validate, persist, then arm. A task is never armed without being
    /// persisted first.
    pub async fn schedule_task(&self, mut task: ScheduledTask) -> Result<String, EngineError> {
        task.targets = task
            .targets
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if task.targets.is_empty() {
            return Err(ValidationError::EmptyTargets.into());
        }

        self.database
            .add_job(&task)
            .await
            .map_err(|e| EngineError::persistence("add job", e))?;

        let task_id = task.id.clone();
        let fire_at = task.fire_at;
        if let Err(e) = self.scheduler.schedule(task).await {
            error!("Failed to arm job {}: {}", task_id, e);
            if let Err(cleanup) = self.database.remove_job(&task_id).await {
                error!("Failed to roll back job {}: {}", task_id, cleanup);
            }
            return Err(EngineError::persistence("arm job", e));
        }

        info!("Job {} scheduled for {}", task_id, fire_at.with_timezone(&Local));
        Ok(task_id)
    }

    pub async fn list_tasks(&self) -> Vec<ScheduledTask> {
        self.scheduler.armed_tasks().await
    }

    /// Remove from the store and disarm. An already fired task is not
    /// stopped; its run completes and still records history.
    pub async fn cancel_task(&self, task_id: &str) -> Result<(), EngineError> {
        self.database
            .remove_job(task_id)
            .await
            .map_err(|e| EngineError::persistence("remove job", e))?;

        if self.scheduler.cancel(task_id).await {
            info!("Job {} cancelled", task_id);
            Ok(())
        } else {
            Err(EngineError::NotFound {
                task_id: task_id.to_string(),
            })
        }
    }

    pub async fn get_history(&self) -> Vec<HistoryEntry> {
        self.database.get_history().await
    }

    pub fn get_clusters(&self) -> ClusterMap {
        self.topology.as_map()
    }

    /// Run a fired task to a terminal outcome. Never fails: every error is
    /// folded into the returned (and recorded) history entry.
    #[instrument(skip(self, task), fields(job = %task.id, action = %task.action))]
    pub async fn run_task(&self, task: ScheduledTask) -> HistoryEntry {
        info!(
            "Executing scheduled task: {} on {:?} (profile: {}, cluster aware: {})",
            task.action, task.targets, task.profile, task.cluster_aware
        );

        let mut entry = HistoryEntry::pending(&task);
        let status = self.execute(&task, &mut entry).await;
        let entry = entry.finish(status);

        match status {
            TaskStatus::Failed => error!("Job {} failed: {}", task.id, entry.detail),
            _ => info!("Job {} finished with {}: {}", task.id, status.as_str(), entry.detail),
        }

        self.settle(&task, &entry).await;
        entry
    }

    async fn execute(&self, task: &ScheduledTask, entry: &mut HistoryEntry) -> TaskStatus {
        let resolution = if task.cluster_aware {
            rolling::resolve_targets(self.agent.as_ref(), &self.topology, task).await
        } else {
            SafetyResolution {
                final_targets: task.targets.clone(),
                skipped: Vec::new(),
            }
        };

        if !resolution.skipped.is_empty() {
            entry.push_detail(&format!(
                "Cluster Safety Skip: {}. At least one peer must be RUNNING. ",
                resolution.skipped.join(", ")
            ));
        }

        if resolution.final_targets.is_empty() {
            entry.push_detail("No eligible servers to run.");
            return TaskStatus::Skipped;
        }

        if !task.cluster_aware {
            return match self
                .agent
                .apply_action(task.action, &resolution.final_targets, &task.profile)
                .await
            {
                Ok(output) => {
                    debug!("Agent output: {}", output);
                    entry.push_detail(&format!(
                        "Executed on: {}",
                        resolution.final_targets.join(", ")
                    ));
                    TaskStatus::Success
                }
                Err(e) => {
                    entry.push_detail(&e.to_string());
                    TaskStatus::Failed
                }
            };
        }

        let mut completed = Vec::new();
        match rolling::roll_out(
            self.agent.as_ref(),
            &self.policy,
            task,
            &resolution.final_targets,
            &mut completed,
        )
        .await
        {
            Ok(()) => {
                entry.push_detail(&format!(
                    "Rolling execution completed on: {}",
                    completed.join(", ")
                ));
                TaskStatus::Success
            }
            Err(e) => {
                entry.push_detail(&e.to_string());
                if !completed.is_empty() {
                    entry.push_detail(&format!(
                        " (completed before abort: {})",
                        completed.join(", ")
                    ));
                }
                TaskStatus::Failed
            }
        }
    }

    /// Record history, then drop the task from the store and timer set
    async fn settle(&self, task: &ScheduledTask, entry: &HistoryEntry) {
        if let Err(e) = self.database.append_history(entry).await {
            error!("Failed to save job history for {}: {}", task.id, e);
        }

        match self.database.remove_job(&task.id).await {
            Ok(true) => debug!("Removed job {} from store", task.id),
            Ok(false) => debug!("Job {} was already removed from store", task.id),
            Err(e) => error!("Failed to remove job {}: {}", task.id, e),
        }

        self.scheduler.cancel(&task.id).await;
    }
}
