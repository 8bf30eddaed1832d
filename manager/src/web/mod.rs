// File: manager/src/web/mod.rs
pub mod handlers;
pub mod server;

pub use server::{create_router, start_web_server};

use std::sync::Arc;

use crate::agent::FleetAgent;
use crate::config::Config;
use crate::services::ExecutionEngine;

// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: Arc<ExecutionEngine>,
    // Used directly for live listings and immediate actions
    pub agent: Arc<dyn FleetAgent>,
}

impl AppState {
    pub fn new(config: Arc<Config>, engine: Arc<ExecutionEngine>, agent: Arc<dyn FleetAgent>) -> Self {
        Self {
            config,
            engine,
            agent,
        }
    }
}
