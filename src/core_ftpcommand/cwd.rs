use crate::core_error::FtpError;
use crate::core_fs::jail::to_physical;
use crate::core_fs::normalize_virtual;
use crate::core_ftpcommand::pwd::quote_path;
use crate::core_network::control::ControlChannel;
use crate::session::Session;
use log::{info, warn};
use std::ffi::CString;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use tokio::fs;

/// Succeeds when `path` is a directory the server may enter. Only search
/// permission is needed, as for `chdir(2)`; listing rights are not.
async fn check_enterable(path: &Path) -> io::Result<()> {
    if !fs::metadata(path).await?.is_dir() {
        return Err(io::Error::new(io::ErrorKind::Other, "not a directory"));
    }
    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    // SAFETY: c_path is a valid NUL-terminated string for the whole call.
    if unsafe { libc::access(c_path.as_ptr(), libc::X_OK) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Handles the CWD (Change Working Directory) FTP command.
///
/// `..` drops the last segment (never above `/`), `.` is a no-op, and any
/// other name is resolved against the current directory inside the jail.
/// The target has to be a directory the server can enter; otherwise the
/// current directory is left as it was.
///
/// # Arguments
///
/// * `control` - The control channel for writing responses to the client.
/// * `session` - The session holding the current virtual directory.
/// * `arg` - The directory to change to.
///
/// # Returns
///
/// Result<(), std::io::Error> indicating the success or failure of the operation.
pub async fn handle_cwd_command(
    control: &mut ControlChannel,
    session: &mut Session,
    arg: &str,
) -> Result<(), std::io::Error> {
    if arg.is_empty() {
        return control.reply_error(&FtpError::InvalidDirectoryName).await;
    }

    let candidate = match arg {
        "." => session.current_dir.clone(),
        other => normalize_virtual(&session.current_dir, other),
    };
    let path = to_physical(&session.root_dir, &candidate);

    if let Err(e) = check_enterable(&path).await {
        warn!("CWD to {:?} failed: {}", path, e);
        return control.reply_error(&FtpError::ChangeDirFailed).await;
    }

    info!("{} changed directory to {}", control.peer_addr(), candidate);
    let response = format!("Directory changed to {}.", quote_path(&candidate));
    session.current_dir = candidate;
    control.reply(250, &response).await
}
