use crate::config::ServerConfig;
use crate::constants::PASV_BIND_ATTEMPTS;
use crate::core_error::FtpError;
use crate::core_network::control::ControlChannel;
use crate::session::{DataMode, Session};
use log::{debug, error, info};
use rand::Rng;
use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio::net::{TcpListener, TcpSocket};

/// Handles the PASV (Passive Mode) FTP command.
///
/// Any previous PORT or PASV setup is discarded before the new listener is
/// opened, so a failure here leaves no data mode at all.
pub async fn handle_pasv_command(
    control: &mut ControlChannel,
    config: &ServerConfig,
    session: &mut Session,
) -> Result<(), std::io::Error> {
    session.set_data_mode(DataMode::None);

    let setup = setup_pasv_listener(config.pasv_port_min, config.pasv_port_max).and_then(
        |(listener, port)| {
            let ip = announced_address(config, control.local_addr())?;
            Ok((listener, port, ip))
        },
    );

    match setup {
        Ok((listener, port, ip)) => {
            session.set_data_mode(DataMode::Passive { listener, port });
            info!("Passive listener for {} on port {}", control.peer_addr(), port);
            control.reply(227, &format_pasv_reply(ip, port)).await
        }
        Err(e) => {
            error!("PASV setup failed for {}: {}", control.peer_addr(), e);
            control.reply_error(&e).await
        }
    }
}

/// Binds a backlog-1 listener on a random port in `min..=max`.
pub fn setup_pasv_listener(min: u16, max: u16) -> Result<(TcpListener, u16), FtpError> {
    let mut rng = rand::thread_rng();
    let mut last_error = None;

    for _ in 0..PASV_BIND_ATTEMPTS {
        let port = rng.gen_range(min..=max);
        let socket = TcpSocket::new_v4().map_err(|e| FtpError::PassiveSetup("create", e))?;
        match socket.bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port)) {
            Ok(()) => {
                let listener = socket
                    .listen(1)
                    .map_err(|e| FtpError::PassiveSetup("listen", e))?;
                debug!("PASV listener bound on port {}", port);
                return Ok((listener, port));
            }
            Err(e) if e.kind() == ErrorKind::AddrInUse => {
                debug!("PASV port {} busy, retrying", port);
                last_error = Some(e);
            }
            Err(e) => return Err(FtpError::PassiveSetup("bind", e)),
        }
    }

    Err(FtpError::PassiveSetup(
        "bind",
        last_error.unwrap_or_else(|| ErrorKind::AddrInUse.into()),
    ))
}

/// The IPv4 address put in the 227 reply: the configured override, or the
/// address the client reached us on.
pub fn announced_address(config: &ServerConfig, local: SocketAddr) -> Result<Ipv4Addr, FtpError> {
    if let Some(ip) = config.pasv_address {
        return Ok(ip);
    }
    match local.ip() {
        IpAddr::V4(ip) => Ok(ip),
        IpAddr::V6(ip) => ip.to_ipv4_mapped().ok_or(FtpError::PassiveAddress),
    }
}

pub fn format_pasv_reply(ip: Ipv4Addr, port: u16) -> String {
    let [h1, h2, h3, h4] = ip.octets();
    format!(
        "Entering Passive Mode ({},{},{},{},{},{}).",
        h1,
        h2,
        h3,
        h4,
        port / 256,
        port % 256
    )
}
