//! Control-connection framing.
//!
//! Commands arrive one per line. [`ControlChannel::read_line`] only mutates its
//! own buffers between awaits, so it can sit in a `tokio::select!` next to a
//! transfer loop and lose nothing when the other branch wins.

use crate::constants::MAX_COMMAND_LENGTH;
use crate::core_error::FtpError;
use log::debug;
use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

#[derive(Debug, PartialEq, Eq)]
pub enum ControlLine {
    Line(String),
    TooLong,
    Closed,
}

pub struct ControlChannel {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    pending: Vec<u8>,
    overflowed: bool,
    local_addr: SocketAddr,
    peer_addr: SocketAddr,
}

impl ControlChannel {
    pub fn new(stream: TcpStream) -> io::Result<Self> {
        let local_addr = stream.local_addr()?;
        let peer_addr = stream.peer_addr()?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            pending: Vec::new(),
            overflowed: false,
            local_addr,
            peer_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Reads the next command line, without its terminator.
    pub async fn read_line(&mut self) -> io::Result<ControlLine> {
        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(ControlLine::Closed);
            }

            let (chunk_len, complete) = match available.iter().position(|&b| b == b'\n') {
                Some(i) => (i + 1, true),
                None => (available.len(), false),
            };

            if !self.overflowed {
                if self.pending.len() + chunk_len > MAX_COMMAND_LENGTH {
                    self.overflowed = true;
                    self.pending.clear();
                } else {
                    self.pending.extend_from_slice(&available[..chunk_len]);
                }
            }
            self.reader.consume(chunk_len);

            if complete {
                if std::mem::take(&mut self.overflowed) {
                    return Ok(ControlLine::TooLong);
                }
                let raw = std::mem::take(&mut self.pending);
                let line = String::from_utf8_lossy(&raw);
                return Ok(ControlLine::Line(
                    line.trim_end_matches(&['\r', '\n'][..]).to_string(),
                ));
            }
        }
    }

    /// Writes a preformatted reply and flushes it.
    pub async fn send_response(&mut self, message: &[u8]) -> io::Result<()> {
        self.writer.write_all(message).await?;
        self.writer.flush().await?;
        Ok(())
    }

    pub async fn reply(&mut self, code: u16, text: &str) -> io::Result<()> {
        debug!("-> {} {} {}", self.peer_addr, code, text);
        self.send_response(format!("{} {}\r\n", code, text).as_bytes())
            .await
    }

    pub async fn reply_multiline(&mut self, code: u16, lines: &[&str]) -> io::Result<()> {
        self.send_response(format_multiline(code, lines).as_bytes())
            .await
    }

    pub async fn reply_error(&mut self, err: &FtpError) -> io::Result<()> {
        debug!("-> {} {}", self.peer_addr, err.to_ftp_response());
        self.send_response(format!("{}\r\n", err.to_ftp_response()).as_bytes())
            .await
    }
}

/// `code-line` for every line but the last, which gets `code line`.
pub fn format_multiline(code: u16, lines: &[&str]) -> String {
    match lines.split_last() {
        None => format!("{} \r\n", code),
        Some((last, rest)) => {
            let mut out = String::new();
            for line in rest {
                out.push_str(&format!("{}-{}\r\n", code, line));
            }
            out.push_str(&format!("{} {}\r\n", code, last));
            out
        }
    }
}
