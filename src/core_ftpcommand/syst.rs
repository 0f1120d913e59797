use crate::core_network::control::ControlChannel;
use log::{error, info};

/// Handles the SYST (System) FTP command.
pub async fn handle_syst_command(control: &mut ControlChannel) -> Result<(), std::io::Error> {
    info!("Responding to SYST command with system type.");

    if let Err(e) = control.reply(215, "UNIX Type: L8").await {
        error!("Failed to send SYST response: {}", e);
        return Err(e);
    }
    Ok(())
}
