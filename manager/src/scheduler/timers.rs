use crate::database::Database;
use crate::scheduler::ScheduledTask;
use anyhow::{anyhow, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, RwLock};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct ArmedTimer {
    job_id: Uuid,
    task: ScheduledTask,
}

/// Holds one-shot timers keyed by task id. A fired timer hands its task to
/// the execution engine over `fired_tx` and never runs the task itself.
pub struct TaskScheduler {
    database: Arc<Database>,
    scheduler: JobScheduler,
    armed: Arc<RwLock<HashMap<String, ArmedTimer>>>,
    fired_tx: mpsc::UnboundedSender<ScheduledTask>,
    running: AtomicBool,
}

impl TaskScheduler {
    pub async fn new(
        database: Arc<Database>,
        fired_tx: mpsc::UnboundedSender<ScheduledTask>,
    ) -> Result<Self> {
        let scheduler = JobScheduler::new().await
            .map_err(|e| anyhow!("Failed to create JobScheduler: {}", e))?;

        Ok(Self {
            database,
            scheduler,
            armed: Arc::new(RwLock::new(HashMap::new())),
            fired_tx,
            running: AtomicBool::new(false),
        })
    }

    /// Start the timer facility and re-arm persisted jobs. Jobs whose fire
    /// time already passed are deleted without firing. Returns how many
    /// jobs were restored.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<usize> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Task scheduler already running");
            return Ok(0);
        }

        self.scheduler.start().await
            .map_err(|e| anyhow!("Failed to start JobScheduler: {}", e))?;
        info!("Task scheduler started");

        let now = Utc::now();
        let mut restored = 0;

        for task in self.database.list_jobs().await {
            if task.is_expired(now) {
                info!("Skipping expired job: {} (was due {})", task.id, task.fire_at);
                if let Err(e) = self.database.remove_job(&task.id).await {
                    error!("Failed to delete expired job {}: {}", task.id, e);
                }
                continue;
            }

            let (task_id, fire_at) = (task.id.clone(), task.fire_at);
            match self.arm(task).await {
                Ok(()) => {
                    restored += 1;
                    info!("Restored job: {} for {}", task_id, fire_at);
                }
                Err(e) => error!("Failed to restore job {}: {}", task_id, e),
            }
        }

        Ok(restored)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Arm a timer for an already persisted task. Replaces any timer
    /// armed under the same id.
    pub async fn schedule(&self, task: ScheduledTask) -> Result<()> {
        self.arm(task).await
    }

    /// Disarm the timer for `task_id`. Returns false when no timer was
    /// armed, including when it already fired.
    pub async fn cancel(&self, task_id: &str) -> bool {
        let removed = self.armed.write().await.remove(task_id);

        match removed {
            Some(timer) => {
                if let Err(e) = self.scheduler.remove(&timer.job_id).await {
                    warn!("Failed to remove timer for job {}: {}", task_id, e);
                }
                info!("Disarmed job {}", task_id);
                true
            }
            None => false,
        }
    }

    /// Armed tasks, soonest first
    pub async fn armed_tasks(&self) -> Vec<ScheduledTask> {
        let armed = self.armed.read().await;
        let mut tasks: Vec<ScheduledTask> = armed.values().map(|t| t.task.clone()).collect();
        tasks.sort_by_key(|t| t.fire_at);
        tasks
    }

    pub async fn is_armed(&self, task_id: &str) -> bool {
        self.armed.read().await.contains_key(task_id)
    }

    async fn arm(&self, task: ScheduledTask) -> Result<()> {
        let delay = (task.fire_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        let fire_instant = Instant::now() + delay;

        let armed = self.armed.clone();
        let fired_tx = self.fired_tx.clone();
        let task_for_timer = task.clone();

        let job = Job::new_one_shot_at_instant_async(fire_instant, move |job_id, _scheduler| {
            let armed = armed.clone();
            let fired_tx = fired_tx.clone();
            let task = task_for_timer.clone();

            Box::pin(async move {
                // Only the timer currently registered for this id may fire
                {
                    let mut armed = armed.write().await;
                    match armed.get(&task.id) {
                        Some(timer) if timer.job_id == job_id => {
                            armed.remove(&task.id);
                        }
                        _ => {
                            debug!("Timer {} for job {} was superseded", job_id, task.id);
                            return;
                        }
                    }
                }

                info!("⏰ Timer fired for job {}", task.id);
                if fired_tx.send(task).is_err() {
                    error!("Execution engine is gone, dropping fired job");
                }
            })
        })
        .map_err(|e| anyhow!("Failed to create timer for job {}: {}", task.id, e))?;

        let job_id = job.guid();
        let task_id = task.id.clone();
        let fire_at = task.fire_at;

        // Register before adding so an immediate fire finds its entry
        let previous = self
            .armed
            .write()
            .await
            .insert(task_id.clone(), ArmedTimer { job_id, task });

        if let Some(previous) = previous {
            debug!("Replacing existing timer for job {}", task_id);
            if let Err(e) = self.scheduler.remove(&previous.job_id).await {
                warn!("Failed to remove replaced timer for job {}: {}", task_id, e);
            }
        }

        if let Err(e) = self.scheduler.add(job).await {
            let mut armed = self.armed.write().await;
            if armed.get(&task_id).map(|t| t.job_id) == Some(job_id) {
                armed.remove(&task_id);
            }
            return Err(anyhow!("Failed to add timer for job {}: {}", task_id, e));
        }

        debug!("Armed job {} for {} (in {:?})", task_id, fire_at, delay);
        Ok(())
    }
}
