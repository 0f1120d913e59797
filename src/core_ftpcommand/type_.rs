use crate::core_error::FtpError;
use crate::core_network::control::ControlChannel;
use log::{info, warn};

/// Handles the TYPE FTP command. Only binary (`I`) is supported.
pub async fn handle_type_command(
    control: &mut ControlChannel,
    arg: &str,
) -> Result<(), std::io::Error> {
    if arg.eq_ignore_ascii_case("I") {
        info!("Binary mode selected by {}", control.peer_addr());
        control.reply(200, "Type set to I.").await
    } else {
        warn!("Unsupported TYPE {:?} from {}", arg, control.peer_addr());
        control
            .reply_error(&FtpError::ParameterNotImplemented(arg.to_string()))
            .await
    }
}
