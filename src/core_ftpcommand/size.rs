use crate::core_error::FtpError;
use crate::core_network::control::ControlChannel;
use crate::session::Session;
use log::{info, warn};
use tokio::fs;

/// Handles the SIZE FTP command for regular files.
pub async fn handle_size_command(
    control: &mut ControlChannel,
    session: &mut Session,
    arg: &str,
) -> Result<(), std::io::Error> {
    if arg.is_empty() {
        return control.reply_error(&FtpError::MissingArgument("SIZE")).await;
    }

    let path = session.resolve(arg);
    let metadata = match fs::metadata(&path).await {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!("SIZE: cannot stat {:?}: {}", path, e);
            return control.reply_error(&FtpError::FileNotFound).await;
        }
    };
    if !metadata.is_file() {
        return control.reply_error(&FtpError::NotAFile).await;
    }

    info!("SIZE {:?}: {} bytes", path, metadata.len());
    control.reply(213, &metadata.len().to_string()).await
}
