//! Daemon configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then `CHAMBER_*`
//! environment variables.

use anyhow::{Context, Result};
use chamber_api_rpc::server::{DEFAULT_RPC_HOST, DEFAULT_RPC_PORT};
use chamber_core::application::{default_roster, validate_roster, MachineSeed};
use ::config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_PREFIX: &str = "CHAMBER";
pub const CONFIG_PATH_VAR: &str = "CHAMBER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "~/.chamber/config.toml";
pub const DEFAULT_DB_PATH: &str = "~/.chamber/reports.db";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_rpc_host")]
    pub rpc_host: String,
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Also write JSON logs to a daily-rolling file here
    #[serde(default)]
    pub log_dir: Option<String>,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_roster")]
    pub machines: Vec<MachineSeed>,
}

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_rpc_host() -> String {
    DEFAULT_RPC_HOST.to_string()
}

fn default_rpc_port() -> u16 {
    DEFAULT_RPC_PORT
}

fn default_tick_interval_ms() -> u64 {
    1_000
}

impl DaemonConfig {
    /// Load from `CHAMBER_CONFIG` (or the default path, if present) and the
    /// process environment
    pub fn load() -> Result<Self> {
        let (path, required) = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) => (path, true),
            Err(_) => (DEFAULT_CONFIG_PATH.to_string(), false),
        };
        Self::load_from(Some(expand(&path)), required, None)
    }

    /// Load from an explicit file and environment map.
    ///
    /// `env` of `None` reads the process environment.
    pub fn load_from(
        file: Option<PathBuf>,
        required: bool,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = &file {
            builder = builder.add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(required),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(env),
        );

        let config: DaemonConfig = builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_roster(&self.machines).context("Invalid machine roster")?;
        if self.tick_interval_ms == 0 {
            anyhow::bail!("tick_interval_ms must be greater than zero");
        }
        if self.db_path.trim().is_empty() {
            anyhow::bail!("db_path must not be empty");
        }
        Ok(())
    }

    /// Database path with `~` expanded
    pub fn db_path(&self) -> PathBuf {
        expand(&self.db_path)
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        self.log_dir.as_deref().map(expand)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
