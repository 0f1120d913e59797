use crate::core_error::FtpError;
use crate::core_network::control::ControlChannel;
use crate::session::{DataMode, Session};
use log::{info, warn};
use std::net::{Ipv4Addr, SocketAddrV4};

/// Parses the `h1,h2,h3,h4,p1,p2` argument of PORT.
pub fn parse_port_argument(arg: &str) -> Result<SocketAddrV4, FtpError> {
    let parts: Vec<&str> = arg.trim().split(',').collect();
    if parts.len() != 6 {
        return Err(FtpError::InvalidPortArgument(format!(
            "expected 6 fields, got {}",
            parts.len()
        )));
    }

    let mut octets = [0u8; 6];
    for (slot, part) in octets.iter_mut().zip(&parts) {
        *slot = part
            .trim()
            .parse::<u8>()
            .map_err(|e| FtpError::InvalidPortArgument(format!("{:?}: {}", part, e)))?;
    }

    let ip = Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3]);
    let port = (octets[4] as u16) << 8 | octets[5] as u16;
    if port == 0 {
        return Err(FtpError::InvalidPortArgument("port 0".to_string()));
    }
    Ok(SocketAddrV4::new(ip, port))
}

/// Handles the PORT (Active Mode) FTP command.
///
/// Only records the client's address; the connection is opened by the next
/// data-bearing command. A malformed argument leaves the current data mode
/// untouched.
pub async fn handle_port_command(
    control: &mut ControlChannel,
    session: &mut Session,
    arg: &str,
) -> Result<(), std::io::Error> {
    let addr = match parse_port_argument(arg) {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Rejected PORT from {}: {}", control.peer_addr(), e);
            return control.reply_error(&e).await;
        }
    };

    // Replacing a passive mode drops, and so closes, its listener.
    session.set_data_mode(DataMode::Active(addr));
    info!("Active mode set for {}: {}", control.peer_addr(), addr);

    control.reply(200, "PORT command successful.").await
}
