pub mod agent;
pub mod config;
pub mod constants;
pub mod database;
pub mod errors;
pub mod scheduler;
pub mod services;
pub mod topology;
pub mod web;

// Re-export commonly used types
pub use agent::{AgentClient, FleetAgent, ImmediateAction, ServerStatusView};
pub use config::{Config, ConfigManager};
pub use database::{Database, HistoryEntry, TaskStatus};
pub use errors::EngineError;
pub use scheduler::{Action, ScheduledTask, TaskScheduler, TimeOfDay};
pub use services::{ExecutionEngine, RollingPolicy};
pub use topology::ClusterTopology;
