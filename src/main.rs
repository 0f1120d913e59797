mod config;
mod constants;
mod core_auth;
mod core_cli;
mod core_error;
mod core_fs;
mod core_ftpcommand;
mod core_network;
mod core_transfer;
mod helpers;
mod server;
mod session;

use crate::config::Config;
use crate::core_cli::Cli;
use anyhow::Result;
use chrono::Local;
use clap::Parser;
use env_logger::{Builder, Env};
use std::io::Write;
use std::path::Path;

const DEFAULT_CONFIG_PATH: &str = "/etc/jailftpd.conf";

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();

    // Initialize the logger with a custom format
    let default_level = if args.verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_level))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();

    // An explicit --config must exist; the default location is optional.
    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            Config::load_from_file(Path::new(DEFAULT_CONFIG_PATH))?
        }
        None => {
            log::info!("No configuration file found, using defaults");
            Config::default()
        }
    };

    if let Some(port) = args.port {
        config.server.listen_port = port;
    }
    if let Some(root) = args.root {
        config.server.root_dir = root;
    }
    config.validate()?;

    // Run the FTP server
    server::run(config).await
}
