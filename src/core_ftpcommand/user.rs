use crate::constants::USERNAME_REGEX;
use crate::core_error::FtpError;
use crate::core_network::control::ControlChannel;
use crate::session::{AuthState, Session};
use log::{info, warn};
use regex::Regex;
use std::sync::OnceLock;

fn username_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(USERNAME_REGEX).ok()).as_ref()
}

pub fn is_valid_username(username: &str) -> bool {
    username_pattern().map_or(false, |pattern| pattern.is_match(username))
}

/// Handles the USER FTP command.
///
/// Records the name and moves the session to waiting for PASS. The name is
/// only checked for shape here; whether the account exists is decided by PASS.
///
/// # Arguments
///
/// * `control` - The control channel for writing responses to the client.
/// * `session` - The session of the connection.
/// * `username` - The username provided by the client.
///
/// # Returns
///
/// Result<(), std::io::Error> indicating the success or failure of the operation.
pub async fn handle_user_command(
    control: &mut ControlChannel,
    session: &mut Session,
    username: &str,
) -> Result<(), std::io::Error> {
    if !is_valid_username(username) {
        warn!("Rejected user name from {}: {:?}", control.peer_addr(), username);
        return control.reply_error(&FtpError::InvalidUserName).await;
    }

    session.username = Some(username.to_string());
    session.auth_state = AuthState::AwaitingPass;

    if username.eq_ignore_ascii_case("anonymous") {
        info!("Anonymous login initiated from {}", control.peer_addr());
        control.reply(331, "Please specify the password.").await
    } else {
        info!("Username accepted: {}", username);
        control
            .reply(331, "Username accepted, please specify the password.")
            .await
    }
}
