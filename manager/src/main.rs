// File: manager/src/main.rs
use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use fleet_manager::agent::{AgentClient, FleetAgent};
use fleet_manager::config::ConfigManager;
use fleet_manager::database::Database;
use fleet_manager::services::{ExecutionEngine, RollingPolicy};
use fleet_manager::topology::ClusterTopology;
use fleet_manager::web::{start_web_server, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with reduced verbosity
    let env_filter = EnvFilter::from_default_env()
        .add_directive("fleet_manager=info".parse()?)
        .add_directive("tower_http=warn".parse()?)
        .add_directive("tokio_cron_scheduler=warn".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("sqlx=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    info!("Starting Fleet Lifecycle Manager");

    // Load configuration
    let config_manager = ConfigManager::new("config".to_string()).await?;
    let config = config_manager.get_current_config();
    info!(
        "Configuration loaded: {} clusters, {} profiles (default: {})",
        config.clusters.len(),
        config.profiles.len(),
        config.default_profile
    );

    // Initialize database
    let database = Arc::new(Database::new(&config.database_path).await?);
    info!("Database initialized at {}", config.database_path);

    let agent: Arc<dyn FleetAgent> = Arc::new(AgentClient::new(config.clone()));
    info!(
        "Agent client initialized ({} {} / {})",
        config.agent.shell, config.agent.status_script, config.agent.action_script
    );

    let topology = Arc::new(ClusterTopology::new(config.clusters.clone()));

    let engine = ExecutionEngine::new(
        database.clone(),
        topology,
        agent.clone(),
        RollingPolicy::default(),
    )
    .await?;

    // Re-arm persisted jobs, discarding the ones that expired while down
    let restored = engine.start().await?;
    info!("Execution engine started, {} pending jobs restored", restored);

    let state = AppState::new(config, engine, agent);
    start_web_server(state).await?;

    Ok(())
}
