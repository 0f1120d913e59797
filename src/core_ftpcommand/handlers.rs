use crate::core_error::FtpError;
use crate::core_ftpcommand::ftpcommand::{CommandLine, FtpCommand};
use crate::core_network::control::ControlChannel;
use crate::core_network::{pasv, port};
use crate::server::ServerContext;
use crate::session::{AuthState, Session};
use log::{debug, info};

/// Whether the connection stays open after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Close,
}

/// The outcome of checking a command against the session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Dispatch(FtpCommand),
    LoginRequired,
    NotImplemented,
    Busy,
}

/// Decides whether a command may run in the current state.
///
/// During a transfer only ABOR and QUIT get through. Before login only the
/// next expected step of USER/PASS (and QUIT) is accepted; once logged in,
/// USER, PASS and unrecognized verbs are refused as not implemented.
pub fn gate(auth_state: AuthState, transferring: bool, command: Option<FtpCommand>) -> Gate {
    use FtpCommand::*;

    if transferring {
        return match command {
            Some(c @ (ABOR | QUIT)) => Gate::Dispatch(c),
            _ => Gate::Busy,
        };
    }

    match (auth_state, command) {
        (_, Some(QUIT)) => Gate::Dispatch(QUIT),
        (AuthState::AwaitingUser, Some(USER)) => Gate::Dispatch(USER),
        (AuthState::AwaitingPass, Some(PASS)) => Gate::Dispatch(PASS),
        (AuthState::AwaitingUser | AuthState::AwaitingPass, _) => Gate::LoginRequired,
        (AuthState::Authenticated, None | Some(USER | PASS)) => Gate::NotImplemented,
        (AuthState::Authenticated, Some(c)) => Gate::Dispatch(c),
    }
}

/// Parses one control line and runs it.
pub async fn handle_line(
    control: &mut ControlChannel,
    ctx: &ServerContext,
    session: &mut Session,
    line: &str,
) -> Result<Flow, std::io::Error> {
    let cmd = CommandLine::parse(line);

    // Never log passwords.
    if cmd.command == Some(FtpCommand::PASS) {
        info!("Received from {}: PASS ****", control.peer_addr());
    } else {
        info!("Received from {}: {}", control.peer_addr(), line);
    }

    match gate(session.auth_state, session.transferring, cmd.command) {
        Gate::Dispatch(command) => dispatch(command, control, ctx, session, &cmd).await,
        Gate::LoginRequired => {
            debug!("{} rejected before login", cmd.verb);
            control.reply_error(&FtpError::LoginRequired).await?;
            Ok(Flow::Continue)
        }
        Gate::NotImplemented => {
            control
                .reply_error(&FtpError::NotImplemented(cmd.verb.clone()))
                .await?;
            Ok(Flow::Continue)
        }
        Gate::Busy => {
            control.reply_error(&FtpError::BusyTransferring).await?;
            Ok(Flow::Continue)
        }
    }
}

async fn dispatch(
    command: FtpCommand,
    control: &mut ControlChannel,
    ctx: &ServerContext,
    session: &mut Session,
    cmd: &CommandLine,
) -> Result<Flow, std::io::Error> {
    use crate::core_ftpcommand::*;

    let config = &ctx.config.server;
    let arg = cmd.arg.as_str();

    match command {
        FtpCommand::USER => user::handle_user_command(control, session, arg).await?,
        FtpCommand::PASS => {
            pass::handle_pass_command(control, ctx.credentials.clone(), session, arg).await?
        }
        FtpCommand::QUIT => {
            quit::handle_quit_command(control).await?;
            return Ok(Flow::Close);
        }
        FtpCommand::ABOR => abor::handle_abor_command(control).await?,
        FtpCommand::SYST => syst::handle_syst_command(control).await?,
        FtpCommand::TYPE => type_::handle_type_command(control, arg).await?,
        FtpCommand::PORT => port::handle_port_command(control, session, arg).await?,
        FtpCommand::PASV => pasv::handle_pasv_command(control, config, session).await?,
        FtpCommand::RETR => {
            return retr::handle_retr_command(control, config, session, arg, cmd.resume).await
        }
        FtpCommand::STOR => {
            return stor::handle_stor_command(control, config, session, arg, cmd.resume).await
        }
        FtpCommand::LIST => return list::handle_list_command(control, config, session, arg).await,
        FtpCommand::REST => rest::handle_rest_command(control, session, arg).await?,
        FtpCommand::SIZE => size::handle_size_command(control, session, arg).await?,
        FtpCommand::CWD => cwd::handle_cwd_command(control, session, arg).await?,
        FtpCommand::PWD => pwd::handle_pwd_command(control, session).await?,
        FtpCommand::MKD => mkd::handle_mkd_command(control, session, arg).await?,
        FtpCommand::RMD => rmd::handle_rmd_command(control, session, arg).await?,
    }

    Ok(Flow::Continue)
}
