use crate::config::ServerConfig;
use crate::core_error::FtpError;
use crate::core_ftpcommand::handlers::Flow;
use crate::core_network::control::ControlChannel;
use crate::core_network::data_channel;
use crate::core_transfer::{conclude, send_stream, OffsetPolicy};
use crate::session::Session;
use log::{error, info, warn};
use std::io::SeekFrom;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncSeekExt;

async fn open_for_download(path: &Path) -> Result<File, FtpError> {
    let file = File::open(path).await.map_err(|_| FtpError::FileNotFound)?;
    let metadata = file.metadata().await.map_err(|_| FtpError::FileNotFound)?;
    if !metadata.is_file() {
        return Err(FtpError::NotAFile);
    }
    Ok(file)
}

/// Handles the RETR (Retrieve) FTP command.
///
/// Streams the file from the REST offset, if one is set. With `-resume` the
/// offset is kept for the next transfer; otherwise it is cleared once the
/// data connection is up.
///
/// # Arguments
///
/// * `control` - The control channel for replies and for watching ABOR/QUIT.
/// * `config` - The server configuration (buffer size, data timeout).
/// * `session` - The session of the connection.
/// * `arg` - The name of the file to retrieve.
/// * `resume` - Whether `-resume` was given.
///
/// # Returns
///
/// Whether the connection stays open, or the control channel error.
pub async fn handle_retr_command(
    control: &mut ControlChannel,
    config: &ServerConfig,
    session: &mut Session,
    arg: &str,
    resume: bool,
) -> Result<Flow, std::io::Error> {
    if arg.is_empty() {
        warn!("RETR command received with no arguments");
        control.reply_error(&FtpError::MissingArgument("RETR")).await?;
        return Ok(Flow::Continue);
    }

    let policy = OffsetPolicy::for_resume(resume);
    let path = session.resolve(arg);

    let mut file = match open_for_download(&path).await {
        Ok(file) => file,
        Err(e) => {
            warn!("RETR {:?} refused: {}", path, e);
            control.reply_error(&e).await?;
            return Ok(Flow::Continue);
        }
    };
    if !session.data_mode.is_configured() {
        control.reply_error(&FtpError::NoDataMode).await?;
        return Ok(Flow::Continue);
    }

    control.reply(150, "Opening BINARY mode data connection.").await?;
    let mut data = match data_channel::establish(session, config.data_timeout()).await {
        Ok(stream) => stream,
        Err(e) => {
            error!("RETR data connection failed: {}", e);
            policy.settle(session);
            control.reply_error(&e).await?;
            return Ok(Flow::Continue);
        }
    };

    let offset = session.transfer_offset;
    policy.settle(session);
    if offset > 0 {
        info!("Resuming download of {:?} at offset {}", path, offset);
        if let Err(e) = file.seek(SeekFrom::Start(offset)).await {
            control.reply_error(&FtpError::ReadFailed(e)).await?;
            return Ok(Flow::Continue);
        }
    }

    info!("Sending {:?} to {}", path, control.peer_addr());
    session.transferring = true;
    let outcome = send_stream(
        control,
        session.auth_state,
        &mut file,
        &mut data,
        config.download_buffer_size,
    )
    .await;
    session.transferring = false;

    conclude(control, data, outcome?, "Transfer complete.").await
}
