use crate::constants::{
    DEFAULT_BUFFER_SIZE, DEFAULT_DATA_TIMEOUT_SECS, DEFAULT_PASV_PORT_MAX, DEFAULT_PASV_PORT_MIN,
};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_address: String,
    pub listen_port: u16,
    pub root_dir: PathBuf,
    pub passwd_file: PathBuf,
    pub pasv_address: Option<Ipv4Addr>, // Public address announced in 227 replies
    pub pasv_port_min: u16,
    pub pasv_port_max: u16,
    pub data_timeout_secs: u64,
    pub upload_buffer_size: usize,
    pub download_buffer_size: usize,
    pub banner_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: String::from("0.0.0.0"),
            listen_port: 21,
            root_dir: PathBuf::from("/tmp"),
            passwd_file: PathBuf::from("etc/passwd.txt"),
            pasv_address: None,
            pasv_port_min: DEFAULT_PASV_PORT_MIN,
            pasv_port_max: DEFAULT_PASV_PORT_MAX,
            data_timeout_secs: DEFAULT_DATA_TIMEOUT_SECS,
            upload_buffer_size: DEFAULT_BUFFER_SIZE,
            download_buffer_size: DEFAULT_BUFFER_SIZE,
            banner_file: None,
        }
    }
}

impl ServerConfig {
    pub fn data_timeout(&self) -> Duration {
        Duration::from_secs(self.data_timeout_secs)
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).context("Failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
        Self::from_toml(&config_str)
            .with_context(|| format!("Invalid configuration file: {}", path.display()))
    }

    /// Rejects settings the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        let server = &self.server;
        if server.pasv_port_min < 1024 {
            bail!("pasv_port_min must be at least 1024, got {}", server.pasv_port_min);
        }
        if server.pasv_port_min > server.pasv_port_max {
            bail!(
                "passive port range is empty: {}..={}",
                server.pasv_port_min,
                server.pasv_port_max
            );
        }
        if server.upload_buffer_size == 0 || server.download_buffer_size == 0 {
            bail!("transfer buffer sizes must be non-zero");
        }
        if server.data_timeout_secs == 0 {
            bail!("data_timeout_secs must be non-zero");
        }
        Ok(())
    }
}
