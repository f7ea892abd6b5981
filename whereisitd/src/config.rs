use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use serde::Deserialize;
use anyhow::{bail, Context, Result};
use crate::sweeper::SWEEP_INTERVAL;

/// Searched in order when no config path is given on the command line
pub const PRIMARY_CONFIG_PATH: &str = "/etc/whereisit.toml";
pub const FALLBACK_CONFIG_PATH: &str = "./whereisit.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Credentials every API request must present
#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
    pub api_key: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,
    /// Device entry lifetime
    #[serde(default = "default_lifetime_hours")]
    pub lifetime_hours: u32,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    #[serde(default)]
    pub verbose: bool,
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8180))
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("./public/")
}

fn default_lifetime_hours() -> u32 {
    24
}

fn default_sweep_interval() -> u64 {
    SWEEP_INTERVAL.as_secs()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            public_dir: default_public_dir(),
            lifetime_hours: default_lifetime_hours(),
            sweep_interval_secs: default_sweep_interval(),
            verbose: false,
        }
    }
}

impl ServerConfig {
    pub fn lifetime(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.lifetime_hours))
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.auth.validate()?;
        Ok(config)
    }
}

impl AuthConfig {
    fn validate(&self) -> Result<()> {
        if self.username.is_empty() || self.password.is_empty() || self.api_key.is_empty() {
            bail!("Missing required credentials: username, password and api_key must be set");
        }
        Ok(())
    }
}

/// The primary path if it exists, else the fallback if that exists.
pub fn locate(primary: impl AsRef<Path>, fallback: impl AsRef<Path>) -> Result<PathBuf> {
    let primary = primary.as_ref();
    let fallback = fallback.as_ref();

    if primary.exists() {
        return Ok(primary.to_path_buf());
    }
    if fallback.exists() {
        return Ok(fallback.to_path_buf());
    }
    bail!(
        "Neither {} nor {} were found",
        primary.display(),
        fallback.display()
    )
}
