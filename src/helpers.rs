use crate::config::Config;
use anyhow::{Context, Result};
use log::{error, info};
use std::fs;
use std::path::Path;

// Helper function to log configuration options
pub fn log_config(config: &Config) {
    let server = &config.server;
    info!("  Listen Address: {}:{}", server.listen_address, server.listen_port);
    info!("  Root Directory: {:?}", server.root_dir);
    info!("  Password File: {:?}", server.passwd_file);
    match server.pasv_address {
        Some(ip) => info!("  PASV Address: {}", ip),
        None => info!("  PASV Address: <control connection address>"),
    }
    info!("  PASV Ports: {}-{}", server.pasv_port_min, server.pasv_port_max);
    info!("  Data Timeout: {}s", server.data_timeout_secs);
    info!("  Upload Buffer Size: {} KB", server.upload_buffer_size / 1024);
    info!("  Download Buffer Size: {} KB", server.download_buffer_size / 1024);
}

pub fn load_banner(path: &Path) -> Result<String> {
    let banner = fs::read_to_string(path)
        .with_context(|| format!("Failed to read banner file: {:?}", path))?;

    let banner = banner.trim_end().to_string();
    if banner.is_empty() {
        error!("Banner file is empty: {:?}", path);
        return Err(anyhow::Error::msg("Banner file is empty."));
    }

    info!("Banner file loaded successfully: {:?}", path);
    Ok(banner)
}
