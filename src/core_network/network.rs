use crate::constants::GREETING;
use crate::core_ftpcommand::handlers::{handle_line, Flow};
use crate::core_network::control::{ControlChannel, ControlLine};
use crate::core_error::FtpError;
use crate::server::ServerContext;
use crate::session::Session;
use anyhow::{Context, Result};
use log::{error, info, warn};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};

pub async fn bind_listener(address: &str, port: u16) -> Result<TcpListener> {
    let listener = TcpListener::bind((address, port))
        .await
        .with_context(|| format!("Failed to bind control listener on {}:{}", address, port))?;
    info!("Server listening on {}:{}", address, port);
    Ok(listener)
}

/// Accepts control connections forever, one task per client.
pub async fn start_server(listener: TcpListener, ctx: Arc<ServerContext>) -> Result<()> {
    loop {
        let (socket, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("Failed to accept connection: {}", e);
                continue;
            }
        };
        info!("New connection from {}", addr);

        let ctx = Arc::clone(&ctx);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, ctx).await {
                error!("Connection error for {}: {}", addr, e);
            }
            info!("Connection closed for {}", addr);
        });
    }
}

pub async fn handle_connection(socket: TcpStream, ctx: Arc<ServerContext>) -> std::io::Result<()> {
    let mut control = ControlChannel::new(socket)?;
    let mut session = Session::new(ctx.root_dir.clone());

    match &ctx.banner {
        Some(banner) => {
            let lines: Vec<&str> = banner.lines().collect();
            control.reply_multiline(220, &lines).await?;
        }
        None => control.reply(220, GREETING).await?,
    }

    loop {
        match control.read_line().await? {
            ControlLine::Closed => {
                info!("Client {} disconnected", control.peer_addr());
                break;
            }
            ControlLine::TooLong => {
                warn!("Overlong command line from {}", control.peer_addr());
                control.reply_error(&FtpError::LineTooLong).await?;
            }
            ControlLine::Line(line) => {
                if handle_line(&mut control, &ctx, &mut session, &line).await? == Flow::Close {
                    break;
                }
            }
        }
    }
    Ok(())
}
