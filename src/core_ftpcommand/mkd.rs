use crate::core_error::FtpError;
use crate::core_ftpcommand::pwd::quote_path;
use crate::core_network::control::ControlChannel;
use crate::session::Session;
use log::{error, info};
use tokio::fs::DirBuilder;

/// Handles the MKD (Make Directory) FTP command.
///
/// Creates a single directory with mode 0755. Missing parents are not
/// created, and an existing name is an error.
pub async fn handle_mkd_command(
    control: &mut ControlChannel,
    session: &mut Session,
    arg: &str,
) -> Result<(), std::io::Error> {
    if arg.is_empty() {
        return control.reply_error(&FtpError::InvalidDirectoryName).await;
    }

    let path = session.resolve(arg);
    info!("Received MKD command for {:?}", path);

    match DirBuilder::new().mode(0o755).create(&path).await {
        Ok(()) => {
            info!("Directory created successfully: {:?}", path);
            control
                .reply(257, &format!("{} created.", quote_path(arg)))
                .await
        }
        Err(e) => {
            error!("Failed to create directory: {:?}, error: {}", path, e);
            control.reply_error(&FtpError::CreateDirFailed(e)).await
        }
    }
}
