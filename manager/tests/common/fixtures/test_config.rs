//! Test configuration builder for creating test configs programmatically

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Builder for creating test configurations
pub struct TestConfigBuilder {
    temp_dir: TempDir,
    main_config: MainConfigBuilder,
    profiles: Vec<ProfileConfigBuilder>,
}

impl TestConfigBuilder {
    /// Create a new test config builder
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self {
            temp_dir,
            main_config: MainConfigBuilder::default(),
            profiles: Vec::new(),
        }
    }

    /// Configure main settings
    pub fn with_main_config<F>(mut self, f: F) -> Self
    where
        F: FnOnce(MainConfigBuilder) -> MainConfigBuilder,
    {
        self.main_config = f(self.main_config);
        self
    }

    /// Add a credential profile file
    pub fn with_profile<F>(mut self, key: &str, f: F) -> Self
    where
        F: FnOnce(ProfileConfigBuilder) -> ProfileConfigBuilder,
    {
        self.profiles.push(f(ProfileConfigBuilder::new(key)));
        self
    }

    /// Build and write config files to temp directory
    pub fn build(self) -> TestConfig {
        let config_dir = self.temp_dir.path().join("config");
        fs::create_dir_all(&config_dir).expect("Failed to create config dir");

        fs::write(config_dir.join("main.toml"), self.main_config.to_toml())
            .expect("Failed to write main.toml");

        for profile in &self.profiles {
            fs::write(
                config_dir.join(format!("{}.toml", profile.key)),
                profile.to_toml(),
            )
            .expect("Failed to write profile config");
        }

        TestConfig {
            _temp_dir: self.temp_dir,
            config_dir,
        }
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Written config directory, removed on drop
pub struct TestConfig {
    _temp_dir: TempDir,
    pub config_dir: PathBuf,
}

impl TestConfig {
    pub fn config_dir_string(&self) -> String {
        self.config_dir.to_string_lossy().to_string()
    }
}

/// Main configuration builder
#[derive(Clone)]
pub struct MainConfigBuilder {
    host: String,
    port: u16,
    database_path: String,
    default_profile: String,
    clusters: Vec<(String, Vec<String>)>,
}

impl MainConfigBuilder {
    pub fn host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn database_path(mut self, path: &str) -> Self {
        self.database_path = path.to_string();
        self
    }

    pub fn default_profile(mut self, profile: &str) -> Self {
        self.default_profile = profile.to_string();
        self
    }

    pub fn cluster(mut self, name: &str, members: &[&str]) -> Self {
        self.clusters.push((
            name.to_string(),
            members.iter().map(|m| m.to_string()).collect(),
        ));
        self
    }

    fn to_toml(&self) -> String {
        let mut toml = format!(
            r#"
host = "{}"
port = {}
database_path = "{}"
default_profile = "{}"

[agent]
shell = "sh"
status_script = "status.sh"
action_script = "action.sh"
working_dir = "."
"#,
            self.host, self.port, self.database_path, self.default_profile
        );

        for (name, members) in &self.clusters {
            let members: Vec<String> = members.iter().map(|m| format!("\"{}\"", m)).collect();
            toml.push_str(&format!(
                "\n[[clusters]]\nname = \"{}\"\nmembers = [{}]\n",
                name,
                members.join(", ")
            ));
        }

        toml
    }
}

impl Default for MainConfigBuilder {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            database_path: ":memory:".to_string(),
            default_profile: "container".to_string(),
            clusters: Vec::new(),
        }
    }
}

/// Credential profile builder
pub struct ProfileConfigBuilder {
    key: String,
    ip: String,
    port: u16,
    user: String,
    password: String,
}

impl ProfileConfigBuilder {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ip: "10.0.0.10".to_string(),
            port: 9043,
            user: "wasadmin".to_string(),
            password: "test-password".to_string(),
        }
    }

    pub fn ip(mut self, ip: &str) -> Self {
        self.ip = ip.to_string();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn credentials(mut self, user: &str, password: &str) -> Self {
        self.user = user.to_string();
        self.password = password.to_string();
        self
    }

    fn to_toml(&self) -> String {
        format!(
            r#"
[profile]
ip = "{}"
port = {}
user = "{}"
password = "{}"
"#,
            self.ip, self.port, self.user, self.password
        )
    }
}
