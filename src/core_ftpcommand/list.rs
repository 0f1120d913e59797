use crate::config::ServerConfig;
use crate::core_error::FtpError;
use crate::core_fs::listing::list_directory;
use crate::core_ftpcommand::handlers::Flow;
use crate::core_network::control::ControlChannel;
use crate::core_network::data_channel;
use crate::core_transfer::{conclude, send_stream};
use crate::session::Session;
use log::{error, info, warn};

/// Handles the LIST FTP command.
///
/// `ls`-style flags such as `-la` are ignored. The listing is built before
/// the 150 reply, so a directory that cannot be read fails with 451 without
/// touching the data channel.
pub async fn handle_list_command(
    control: &mut ControlChannel,
    config: &ServerConfig,
    session: &mut Session,
    arg: &str,
) -> Result<Flow, std::io::Error> {
    let target = if arg.starts_with('-') { "" } else { arg };
    let path = session.resolve(target);
    info!("Listing {:?} for {}", path, control.peer_addr());

    if tokio::fs::metadata(&path).await.is_err() {
        warn!("LIST target does not exist: {:?}", path);
        control.reply_error(&FtpError::DirectoryNotFound).await?;
        return Ok(Flow::Continue);
    }
    if !session.data_mode.is_configured() {
        control.reply_error(&FtpError::NoDataMode).await?;
        return Ok(Flow::Continue);
    }

    let listing = match list_directory(&path).await {
        Ok(lines) => lines
            .iter()
            .map(|line| format!("{}\r\n", line))
            .collect::<String>(),
        Err(e) => {
            error!("Failed to list {:?}: {}", path, e);
            control.reply_error(&FtpError::ListFailed(e)).await?;
            return Ok(Flow::Continue);
        }
    };

    control.reply(150, "Here comes the directory listing.").await?;
    let mut data = match data_channel::establish(session, config.data_timeout()).await {
        Ok(stream) => stream,
        Err(e) => {
            error!("LIST data connection failed: {}", e);
            control.reply_error(&e).await?;
            return Ok(Flow::Continue);
        }
    };

    session.transferring = true;
    let mut source = listing.as_bytes();
    let outcome = send_stream(
        control,
        session.auth_state,
        &mut source,
        &mut data,
        config.download_buffer_size,
    )
    .await;
    session.transferring = false;

    conclude(control, data, outcome?, "Directory send OK.").await
}
