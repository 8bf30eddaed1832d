pub mod manager;
use crate::constants::defaults;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
pub use manager::ConfigManager;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_profile")]
    pub default_profile: String,
    #[serde(default)]
    pub agent: AgentConfig,
    // Order matters: the first cluster listing a server wins
    #[serde(default)]
    pub clusters: Vec<ClusterDefinition>,
    // Populated from individual profile config files
    #[serde(skip)]
    pub profiles: HashMap<String, ProfileConfig>,
}

/// How the external fleet control agent is invoked
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub shell: String,
    pub status_script: String,
    pub action_script: String,
    pub working_dir: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            shell: defaults::AGENT_SHELL.to_string(),
            status_script: defaults::STATUS_SCRIPT.to_string(),
            action_script: defaults::ACTION_SCRIPT.to_string(),
            working_dir: ".".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterDefinition {
    pub name: String,
    pub members: Vec<String>,
}

/// Connection bundle for one application-server host
#[derive(Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub ip: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

// Keep credentials out of logs
impl fmt::Debug for ProfileConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileConfig")
            .field("ip", &self.ip)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfigFile {
    pub profile: ProfileConfig,
}

impl Config {
    pub fn profile(&self, key: &str) -> Option<&ProfileConfig> {
        self.profiles.get(key)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_path: default_database_path(),
            default_profile: default_profile(),
            agent: AgentConfig::default(),
            clusters: Vec::new(),
            profiles: HashMap::new(),
        }
    }
}

fn default_host() -> String {
    defaults::HOST.to_string()
}

fn default_port() -> u16 {
    defaults::PORT
}

fn default_database_path() -> String {
    defaults::DATABASE_PATH.to_string()
}

fn default_profile() -> String {
    defaults::PROFILE.to_string()
}
