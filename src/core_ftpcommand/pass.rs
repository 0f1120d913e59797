use crate::constants::{MAX_PASSWORD_LENGTH, WELCOME_BANNER};
use crate::core_auth::{CredentialCheck, CredentialStore};
use crate::core_error::FtpError;
use crate::core_network::control::ControlChannel;
use crate::session::{AuthState, Session};
use log::{error, info, warn};
use std::io;
use std::sync::Arc;

pub fn is_valid_password(password: &str) -> bool {
    password.len() <= MAX_PASSWORD_LENGTH && !password.contains(&['\r', '\n'][..])
}

/// Checks the pair against the store, registering unknown users.
fn authenticate(
    credentials: &dyn CredentialStore,
    username: &str,
    password: &str,
) -> Result<(), FtpError> {
    match credentials.check(username, password) {
        Ok(CredentialCheck::Match) => Ok(()),
        Ok(CredentialCheck::Mismatch) => Err(FtpError::LoginIncorrect(username.to_string())),
        Ok(CredentialCheck::Unknown) => credentials
            .register(username, password)
            .map_err(|e| FtpError::RegistrationFailed(username.to_string(), e)),
        Err(e) => Err(FtpError::CredentialLookup(e)),
    }
}

/// Handles the PASS FTP command.
///
/// The credential file is read (and possibly appended to) on the blocking
/// pool. The password itself is never logged.
pub async fn handle_pass_command(
    control: &mut ControlChannel,
    credentials: Arc<dyn CredentialStore>,
    session: &mut Session,
    password: &str,
) -> Result<(), std::io::Error> {
    if !is_valid_password(password) {
        warn!("Rejected malformed password from {}", control.peer_addr());
        return control.reply_error(&FtpError::InvalidPassword).await;
    }

    let username = session.username.clone().unwrap_or_default();
    let user = username.clone();
    let pass = password.to_string();
    let result = tokio::task::spawn_blocking(move || authenticate(credentials.as_ref(), &user, &pass))
        .await
        .unwrap_or_else(|e| Err(FtpError::CredentialLookup(io::Error::new(io::ErrorKind::Other, e))));

    match result {
        Ok(()) => {
            session.auth_state = AuthState::Authenticated;
            info!("User {} logged in from {}", username, control.peer_addr());
            control.reply_multiline(230, WELCOME_BANNER).await
        }
        Err(e) => {
            error!("Login failed for {}: {}", username, e);
            control.reply_error(&e).await
        }
    }
}
