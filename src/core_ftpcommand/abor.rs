use crate::core_network::control::ControlChannel;
use log::info;

/// Handles ABOR when no transfer is running. Aborting a running transfer is
/// done by the transfer engine, which watches the control channel itself.
pub async fn handle_abor_command(control: &mut ControlChannel) -> Result<(), std::io::Error> {
    info!("ABOR from {} with no transfer in progress", control.peer_addr());
    control.reply(226, "ABOR command successful.").await
}
