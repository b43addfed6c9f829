//! Configuration management for the session store
//!
//! Loads settings from TOML file at ~/.sessionstore/config.toml

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Backing table configuration
    #[serde(default)]
    pub table: TableConfig,

    /// Session handler behavior
    #[serde(default)]
    pub session: SessionConfig,

    /// Data directory (defaults to ~/.sessionstore)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|p| p.join(".sessionstore"))
        .unwrap_or_else(|| PathBuf::from(".sessionstore"))
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server port (default: 3120)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Server host (default: 127.0.0.1 - localhost only)
    #[serde(default = "default_host")]
    pub host: String,

    /// Optional API key for authentication
    /// Required in Authorization header if set: "Authorization: Bearer <key>"
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_port() -> u16 {
    3120
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: default_port(),
            host: default_host(),
            api_key: None,
        }
    }
}

/// Storage backend for the session table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// SQLite file under `data_dir`
    #[default]
    Sqlite,
    /// Volatile in-process table, lost on restart
    Memory,
}

/// Backing table configuration
///
/// The physical table name is `<name>-<env>`, mirroring how the deployment
/// suffixes the base table name with the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// Base table name
    #[serde(default = "default_table_name")]
    pub name: String,

    /// Environment suffix (dev, staging, prod)
    #[serde(default = "default_env")]
    pub env: String,

    /// Storage backend
    #[serde(default)]
    pub backend: Backend,
}

fn default_table_name() -> String {
    "Session".to_string()
}

fn default_env() -> String {
    "dev".to_string()
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            name: default_table_name(),
            env: default_env(),
            backend: Backend::default(),
        }
    }
}

impl TableConfig {
    /// Physical table name: `<name>-<env>`
    pub fn table_name(&self) -> String {
        format!("{}-{}", self.name, self.env)
    }
}

/// How PATCH treats ids with no stored item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// Write unconditionally; unknown ids get a partial item
    #[default]
    Upsert,
    /// Only touch existing items; unknown ids are reported as not found
    UpdateOnly,
}

/// Session handler behavior
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionConfig {
    #[serde(default)]
    pub update_mode: UpdateMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig::default(),
            table: TableConfig::default(),
            session: SessionConfig::default(),
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let expanded_path = expand_path(path.as_ref());

        if !expanded_path.exists() {
            return Err(CoreError::Config(format!(
                "Configuration file not found: {}",
                expanded_path.display()
            )));
        }

        let content = std::fs::read_to_string(&expanded_path)?;
        let config: Config = toml::from_str(&content)?;

        Ok(config)
    }

    /// Get the data directory, expanding ~ if present
    pub fn data_dir(&self) -> PathBuf {
        expand_path(&self.data_dir)
    }

    /// Path of the SQLite database file
    pub fn db_path(&self) -> PathBuf {
        self.data_dir().join("sessions.db")
    }

    /// Get the server socket address
    pub fn server_addr(&self) -> SocketAddr {
        use std::net::ToSocketAddrs;

        format!("{}:{}", self.server.host, self.server.port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], self.server.port)))
    }

    /// Check the values a file cannot express through types alone
    pub fn validate(&self) -> Result<()> {
        if self.table.name.trim().is_empty() {
            return Err(CoreError::Config("table.name must not be empty".to_string()));
        }
        if self.table.env.trim().is_empty() {
            return Err(CoreError::Config("table.env must not be empty".to_string()));
        }
        Ok(())
    }

    /// Apply environment variable overrides
    ///
    /// `TABLENAME` and `ENV` are the variables the function runtime provides;
    /// the `SESSIONSTORE_*` ones cover the server options.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = var("TABLENAME").filter(|v| !v.is_empty()) {
            self.table.name = name;
        }
        if let Some(env) = var("ENV").filter(|v| !v.is_empty()) {
            self.table.env = env;
        }
        if let Some(host) = var("SESSIONSTORE_SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("SESSIONSTORE_SERVER_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid SESSIONSTORE_SERVER_PORT: {}", port),
            }
        }
        if let Some(key) = var("SESSIONSTORE_SERVER_API_KEY") {
            self.server.api_key = if key.is_empty() { None } else { Some(key) };
        }
        if let Some(data_dir) = var("SESSIONSTORE_DATA_DIR") {
            self.data_dir = PathBuf::from(data_dir);
        }
    }

    /// Create a default configuration file at the given path
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<()> {
        let content = r#"# Sessionstore Configuration

[server]
# Port to listen on (default: 3120)
port = 3120

# Host to bind to
# "127.0.0.1" = localhost only
# "0.0.0.0" = all interfaces (put it behind a gateway or set api_key)
host = "127.0.0.1"

# Optional API key for authentication
# If set, clients must send: Authorization: Bearer <api_key>
# api_key = "your-secret-key"

[table]
# Physical table is "<name>-<env>" (overridden by TABLENAME / ENV)
name = "Session"
env = "dev"

# "sqlite" (file under data_dir) or "memory" (lost on restart)
backend = "sqlite"

[session]
# "upsert": PATCH on an unknown id writes a partial item
# "update_only": PATCH on an unknown id returns 404
update_mode = "upsert"
"#;

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;

        Ok(())
    }
}

/// Expand ~ to home directory in paths
pub fn expand_path(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
