use crate::core_error::FtpError;
use crate::core_fs::jail::to_physical;
use crate::core_fs::normalize_virtual;
use crate::core_fs::FileLock;
use crate::core_network::control::ControlChannel;
use crate::session::Session;
use log::{error, info};
use std::fs::File;
use std::io;
use std::path::Path;

/// Locks the directory exclusively and removes it. Waits for the lock if
/// another session holds it.
fn remove_locked_dir(path: &Path) -> Result<(), FtpError> {
    let handle = File::open(path).map_err(|_| FtpError::DirectoryNotFound)?;
    let guard = FileLock::exclusive(handle).map_err(FtpError::DirectoryLockFailed)?;
    std::fs::remove_dir(path).map_err(FtpError::RemoveDirFailed)?;
    drop(guard);
    Ok(())
}

/// Handles the RMD (Remove Directory) FTP command. Only empty directories
/// can be removed, and never the root of the jail.
pub async fn handle_rmd_command(
    control: &mut ControlChannel,
    session: &mut Session,
    arg: &str,
) -> Result<(), std::io::Error> {
    if arg.is_empty() {
        return control.reply_error(&FtpError::InvalidDirectoryName).await;
    }

    let target = normalize_virtual(&session.current_dir, arg);
    if target == "/" {
        return control.reply_error(&FtpError::RootDirectory).await;
    }

    let path = to_physical(&session.root_dir, &target);
    if tokio::fs::symlink_metadata(&path).await.is_err() {
        return control.reply_error(&FtpError::DirectoryNotFound).await;
    }

    let blocking_path = path.clone();
    let result = tokio::task::spawn_blocking(move || remove_locked_dir(&blocking_path))
        .await
        .unwrap_or_else(|e| Err(FtpError::RemoveDirFailed(io::Error::new(io::ErrorKind::Other, e))));

    match result {
        Ok(()) => {
            info!("Directory removed successfully: {:?}", path);
            control
                .reply(250, &format!("Directory \"{}\" removed successfully.", arg))
                .await
        }
        Err(e) => {
            error!("Failed to remove directory {:?}: {}", path, e);
            control.reply_error(&e).await
        }
    }
}
