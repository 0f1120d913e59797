use crate::constants::GOODBYE_BANNER;
use crate::core_network::control::ControlChannel;
use log::{error, info};

pub async fn send_goodbye(control: &mut ControlChannel) -> Result<(), std::io::Error> {
    control.reply_multiline(221, GOODBYE_BANNER).await
}

/// Handles the QUIT FTP command.
///
/// Accepted in every state. The caller closes the connection afterwards.
pub async fn handle_quit_command(control: &mut ControlChannel) -> Result<(), std::io::Error> {
    info!("Received QUIT from {}. Closing connection.", control.peer_addr());

    if let Err(e) = send_goodbye(control).await {
        error!("Failed to send QUIT response: {}", e);
        return Err(e);
    }
    Ok(())
}
