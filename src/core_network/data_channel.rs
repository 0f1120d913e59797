use crate::core_error::FtpError;
use crate::session::{DataMode, Session};
use log::{debug, info};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Turns the pending data mode into a connected data socket.
///
/// Passive mode accepts exactly one connection and then closes the listener;
/// active mode connects out to the address given by PORT. Either way the
/// session is left with no data mode, whether or not the connection succeeds.
pub async fn establish(session: &mut Session, wait: Duration) -> Result<TcpStream, FtpError> {
    match session.take_data_mode() {
        DataMode::None => Err(FtpError::NoDataMode),
        DataMode::Passive { listener, port } => {
            debug!("Waiting for passive data connection on port {}", port);
            let (stream, peer) = timeout(wait, listener.accept())
                .await
                .map_err(|_| FtpError::DataConnectionTimeout)?
                .map_err(FtpError::DataConnection)?;
            info!("Accepted data connection from {} on port {}", peer, port);
            // `listener` is dropped here, closing the passive port.
            Ok(stream)
        }
        DataMode::Active(addr) => {
            debug!("Connecting data channel to {}", addr);
            let stream = timeout(wait, TcpStream::connect(addr))
                .await
                .map_err(|_| FtpError::DataConnectionTimeout)?
                .map_err(FtpError::DataConnection)?;
            info!("Data connection established with {}", addr);
            Ok(stream)
        }
    }
}
