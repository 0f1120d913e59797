use crate::config::Config;
use crate::core_auth::{CredentialStore, PasswdFile};
use crate::core_network::network;
use crate::helpers::{load_banner, log_config};
use anyhow::{Context, Result};
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;

/// Everything a connection task reads but never changes.
pub struct ServerContext {
    pub config: Config,
    pub root_dir: PathBuf, // Canonical form of `config.server.root_dir`
    pub credentials: Arc<dyn CredentialStore>,
    pub banner: Option<String>,
}

impl ServerContext {
    pub fn new(config: Config, credentials: Arc<dyn CredentialStore>) -> Result<Self> {
        let root_dir = config
            .server
            .root_dir
            .canonicalize()
            .with_context(|| format!("Invalid root directory: {:?}", config.server.root_dir))?;

        let banner = match &config.server.banner_file {
            Some(path) => Some(load_banner(path)?),
            None => None,
        };

        Ok(Self {
            config,
            root_dir,
            credentials,
            banner,
        })
    }
}

/// Runs the FTP server with the provided configuration.
///
/// Binds the control port and serves connections until the process is
/// stopped. Only startup failures are returned.
pub async fn run(config: Config) -> Result<()> {
    log_config(&config);

    let credentials = Arc::new(PasswdFile::new(config.server.passwd_file.clone()));
    let ctx = Arc::new(ServerContext::new(config, credentials)?);
    info!("Serving files from {:?}", ctx.root_dir);

    let listener = network::bind_listener(
        &ctx.config.server.listen_address,
        ctx.config.server.listen_port,
    )
    .await?;

    if let Err(e) = network::start_server(listener, ctx).await {
        error!("Server stopped: {}", e);
        return Err(e);
    }
    Ok(())
}
