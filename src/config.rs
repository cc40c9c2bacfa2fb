//! Server configuration.
//!
//! Every field has a default, so an empty YAML document is a valid
//! configuration. `Config::load()` is what the binary uses.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use serde::Deserialize;

/// Environment variable naming a YAML config file.
pub const CONFIG_ENV: &str = "TINYWEB_CONFIG";

/// Environment variable overriding the listening port.
pub const PORT_ENV: &str = "TINYWEB_PORT";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server name, used for logging and the on-start callback.
    pub name: String,
    pub host: IpAddr,
    pub port: u16,
    /// Idle lifetime of a session in seconds.
    pub session_ttl_secs: u64,
    /// How often expired sessions are swept while the server runs.
    pub session_sweep_interval_secs: u64,
    /// Directory served under `static_prefix`. Static serving is off when unset.
    pub static_root: Option<PathBuf>,
    pub static_prefix: String,
    /// Number of connections processed concurrently.
    pub worker_pool_size: usize,
    /// Pending-connection queue length of the listening socket.
    pub backlog: u32,
    /// Per-read timeout on accepted connections, in milliseconds.
    pub read_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: "tinyweb".to_string(),
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            session_ttl_secs: 900,
            session_sweep_interval_secs: 60,
            static_root: None,
            static_prefix: "/web-content".to_string(),
            worker_pool_size: 10,
            backlog: 10,
            read_timeout_ms: 2000,
        }
    }
}

impl Config {
    /// Parses a YAML document. Missing keys take their defaults.
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(yaml).context("invalid YAML configuration")?;
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&yaml)
    }

    /// Loads the file named by `TINYWEB_CONFIG` (defaults otherwise), then
    /// applies the `TINYWEB_PORT` override and validates the result.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };

        if let Ok(port) = std::env::var(PORT_ENV) {
            cfg.port = port
                .parse()
                .with_context(|| format!("{PORT_ENV} must be a port number, got `{port}`"))?;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.name.trim().is_empty() {
            bail!("server name must not be empty");
        }
        if self.worker_pool_size == 0 {
            bail!("worker_pool_size must be at least 1");
        }
        if self.read_timeout_ms == 0 {
            bail!("read_timeout_ms must be greater than zero");
        }
        if !self.static_prefix.starts_with('/') {
            bail!("static_prefix must start with '/', got `{}`", self.static_prefix);
        }
        if let Some(root) = &self.static_root {
            if !root.is_dir() {
                bail!("static root {} is not a directory", root.display());
            }
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// Sweep period, never longer than the TTL and never below one second.
    pub fn sweep_interval(&self) -> Duration {
        let secs = self
            .session_sweep_interval_secs
            .min(self.session_ttl_secs)
            .max(1);
        Duration::from_secs(secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}
