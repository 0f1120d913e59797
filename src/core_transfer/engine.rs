//! Streaming between a local source/sink and the data socket.
//!
//! While bytes move, the control channel is watched in the same task: ABOR
//! stops the transfer, QUIT stops it and ends the session, anything else is
//! answered with 425 and the transfer carries on.

use crate::core_error::FtpError;
use crate::core_ftpcommand::ftpcommand::{CommandLine, FtpCommand};
use crate::core_ftpcommand::handlers::{gate, Flow, Gate};
use crate::core_ftpcommand::quit::send_goodbye;
use crate::core_network::control::{ControlChannel, ControlLine};
use crate::session::{AuthState, Session};
use log::{info, warn};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

/// What happens to `transfer_offset` once a transfer has used it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetPolicy {
    /// Plain RETR/STOR: the REST offset is single-use and cleared afterwards.
    Consume,
    /// `-resume` RETR/STOR: the offset is honoured and left in place.
    Retain,
}

impl OffsetPolicy {
    pub fn for_resume(resume: bool) -> Self {
        if resume {
            OffsetPolicy::Retain
        } else {
            OffsetPolicy::Consume
        }
    }

    pub fn settle(self, session: &mut Session) {
        if self == OffsetPolicy::Consume {
            session.transfer_offset = 0;
        }
    }
}

#[derive(Debug)]
pub enum TransferOutcome {
    Completed(u64),
    Failed(FtpError),
    Aborted,
    Quit,
}

enum Interrupt {
    Abort,
    Quit,
}

/// Answers a control line that arrived mid-transfer.
async fn on_control_line(
    control: &mut ControlChannel,
    auth_state: AuthState,
    line: io::Result<ControlLine>,
) -> io::Result<Option<Interrupt>> {
    let text = match line? {
        ControlLine::Closed => {
            warn!("Control connection {} closed mid-transfer", control.peer_addr());
            return Ok(Some(Interrupt::Quit));
        }
        ControlLine::TooLong => {
            control.reply_error(&FtpError::LineTooLong).await?;
            return Ok(None);
        }
        ControlLine::Line(text) => text,
    };

    let cmd = CommandLine::parse(&text);
    info!("Received from {} during transfer: {}", control.peer_addr(), cmd.verb);
    match gate(auth_state, true, cmd.command) {
        Gate::Dispatch(FtpCommand::ABOR) => Ok(Some(Interrupt::Abort)),
        Gate::Dispatch(FtpCommand::QUIT) => Ok(Some(Interrupt::Quit)),
        _ => {
            control.reply_error(&FtpError::BusyTransferring).await?;
            Ok(None)
        }
    }
}

impl From<Interrupt> for TransferOutcome {
    fn from(interrupt: Interrupt) -> Self {
        match interrupt {
            Interrupt::Abort => TransferOutcome::Aborted,
            Interrupt::Quit => TransferOutcome::Quit,
        }
    }
}

/// Copies `source` to the data socket in `buffer_size` chunks, retrying
/// partial writes until each chunk is fully sent.
pub async fn send_stream<R: AsyncRead + Unpin>(
    control: &mut ControlChannel,
    auth_state: AuthState,
    source: &mut R,
    data: &mut TcpStream,
    buffer_size: usize,
) -> io::Result<TransferOutcome> {
    let mut buffer = vec![0u8; buffer_size];
    let mut total = 0u64;

    loop {
        let n = match source.read(&mut buffer).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => return Ok(TransferOutcome::Failed(FtpError::ReadFailed(e))),
        };

        let mut sent = 0;
        while sent < n {
            tokio::select! {
                written = data.write(&buffer[sent..n]) => match written {
                    Ok(0) => {
                        let e = io::Error::from(io::ErrorKind::WriteZero);
                        return Ok(TransferOutcome::Failed(FtpError::SendFailed(e)));
                    }
                    Ok(w) => sent += w,
                    Err(e) => return Ok(TransferOutcome::Failed(FtpError::SendFailed(e))),
                },
                line = control.read_line() => {
                    if let Some(interrupt) = on_control_line(control, auth_state, line).await? {
                        return Ok(interrupt.into());
                    }
                }
            }
        }
        total += n as u64;
    }

    Ok(TransferOutcome::Completed(total))
}

/// Reads the data socket until the peer closes it, writing every chunk to
/// `sink`. A failed local write ends the transfer with 552.
pub async fn receive_stream<W: AsyncWrite + Unpin>(
    control: &mut ControlChannel,
    auth_state: AuthState,
    data: &mut TcpStream,
    sink: &mut W,
    buffer_size: usize,
) -> io::Result<TransferOutcome> {
    let mut buffer = vec![0u8; buffer_size];
    let mut total = 0u64;

    loop {
        tokio::select! {
            received = data.read(&mut buffer) => match received {
                Ok(0) => break,
                Ok(n) => {
                    if let Err(e) = sink.write_all(&buffer[..n]).await {
                        return Ok(TransferOutcome::Failed(FtpError::StorageExceeded(e)));
                    }
                    total += n as u64;
                }
                Err(e) => return Ok(TransferOutcome::Failed(FtpError::ReceiveFailed(e))),
            },
            line = control.read_line() => {
                if let Some(interrupt) = on_control_line(control, auth_state, line).await? {
                    return Ok(interrupt.into());
                }
            }
        }
    }

    if let Err(e) = sink.flush().await {
        return Ok(TransferOutcome::Failed(FtpError::StorageExceeded(e)));
    }
    Ok(TransferOutcome::Completed(total))
}

/// Closes the data socket and sends the final reply for `outcome`.
pub async fn conclude(
    control: &mut ControlChannel,
    mut data: TcpStream,
    outcome: TransferOutcome,
    success_text: &str,
) -> io::Result<Flow> {
    match outcome {
        TransferOutcome::Completed(bytes) => {
            // Half-close first so the peer sees EOF before the 226.
            if let Err(e) = data.shutdown().await {
                warn!("Failed to shut down data connection: {}", e);
            }
            drop(data);
            info!("Transfer to/from {} complete: {} bytes", control.peer_addr(), bytes);
            control.reply(226, success_text).await?;
            Ok(Flow::Continue)
        }
        TransferOutcome::Failed(e) => {
            drop(data);
            warn!("Transfer for {} failed: {}", control.peer_addr(), e);
            control.reply_error(&e).await?;
            Ok(Flow::Continue)
        }
        TransferOutcome::Aborted => {
            drop(data);
            info!("Transfer for {} aborted by client", control.peer_addr());
            control.reply_error(&FtpError::Aborted).await?;
            control.reply(226, "ABOR command successful.").await?;
            Ok(Flow::Continue)
        }
        TransferOutcome::Quit => {
            drop(data);
            // The peer may already be gone; nothing left to report to.
            let _ = send_goodbye(control).await;
            Ok(Flow::Close)
        }
    }
}
