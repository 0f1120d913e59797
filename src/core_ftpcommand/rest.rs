use crate::core_error::FtpError;
use crate::core_network::control::ControlChannel;
use crate::session::Session;
use log::{info, warn};

pub fn parse_offset(arg: &str) -> Result<u64, FtpError> {
    arg.trim()
        .parse::<u64>()
        .map_err(|_| FtpError::InvalidOffset(arg.to_string()))
}

/// Handles the REST FTP command.
///
/// Only stores the offset. RETR and STOR decide what to do with it.
pub async fn handle_rest_command(
    control: &mut ControlChannel,
    session: &mut Session,
    arg: &str,
) -> Result<(), std::io::Error> {
    match parse_offset(arg) {
        Ok(offset) => {
            session.transfer_offset = offset;
            info!("Restart offset for {} set to {}", control.peer_addr(), offset);
            control
                .reply(
                    350,
                    &format!("Restarting at {}. Send STOR or RETR to resume transfer.", offset),
                )
                .await
        }
        Err(e) => {
            warn!("Rejected REST from {}: {}", control.peer_addr(), e);
            control.reply_error(&e).await
        }
    }
}
