use crate::config::ServerConfig;
use crate::core_error::FtpError;
use crate::core_fs::{FileLock, TryLock};
use crate::core_ftpcommand::handlers::Flow;
use crate::core_network::control::ControlChannel;
use crate::core_network::data_channel;
use crate::core_transfer::{conclude, receive_stream, OffsetPolicy, TransferOutcome};
use crate::session::Session;
use log::{error, info, warn};
use std::io::SeekFrom;
use std::path::Path;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncSeekExt;

/// Opens the upload target without truncating it.
///
/// A resumed or offset upload needs the file to exist already. A plain
/// upload creates it; truncation waits until the lock is held.
async fn open_for_upload(path: &Path, in_place: bool) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true);
    if in_place {
        options.read(true);
    } else {
        options.create(true);
    }
    options.open(path).await
}

/// Handles the STOR (Store) FTP command.
///
/// The target is locked exclusively for the whole upload; a second uploader
/// gets 550 and the file is left alone. With a REST offset the upload
/// overwrites from that position and the file is cut to offset plus the
/// bytes received. `-resume` writes into an existing file without cutting it.
pub async fn handle_stor_command(
    control: &mut ControlChannel,
    config: &ServerConfig,
    session: &mut Session,
    arg: &str,
    resume: bool,
) -> Result<Flow, std::io::Error> {
    if arg.is_empty() {
        warn!("STOR command received with no arguments");
        control.reply_error(&FtpError::MissingArgument("STOR")).await?;
        return Ok(Flow::Continue);
    }
    if !session.data_mode.is_configured() {
        control.reply_error(&FtpError::UsePortOrPasv).await?;
        return Ok(Flow::Continue);
    }

    let policy = OffsetPolicy::for_resume(resume);
    let path = session.resolve(arg);
    let offset = session.transfer_offset;
    let in_place = resume || offset > 0;

    let file = match open_for_upload(&path, in_place).await {
        Ok(file) => file,
        Err(e) => {
            error!("STOR cannot open {:?}: {}", path, e);
            control.reply_error(&FtpError::OpenFailed(e)).await?;
            return Ok(Flow::Continue);
        }
    };

    if offset > 0 {
        let length = match file.metadata().await {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                control.reply_error(&FtpError::OpenFailed(e)).await?;
                return Ok(Flow::Continue);
            }
        };
        if offset > length {
            control
                .reply_error(&FtpError::OffsetBeyondEnd { offset, length })
                .await?;
            return Ok(Flow::Continue);
        }
    }

    let mut file = match FileLock::try_exclusive(file) {
        Ok(TryLock::Acquired(guard)) => guard,
        Ok(TryLock::Contended(_)) => {
            warn!("STOR {:?} refused: file is locked by another session", path);
            policy.settle(session);
            control.reply_error(&FtpError::FileLocked).await?;
            return Ok(Flow::Continue);
        }
        Err(e) => {
            error!("STOR cannot lock {:?}: {}", path, e);
            policy.settle(session);
            control.reply_error(&FtpError::OpenFailed(e)).await?;
            return Ok(Flow::Continue);
        }
    };

    let prepared = if in_place {
        (*file).seek(SeekFrom::Start(offset)).await.map(|_| ())
    } else {
        file.set_len(0).await
    };
    if let Err(e) = prepared {
        drop(file);
        policy.settle(session);
        control.reply_error(&FtpError::OpenFailed(e)).await?;
        return Ok(Flow::Continue);
    }

    control.reply(150, "Ok to send data.").await?;
    let mut data = match data_channel::establish(session, config.data_timeout()).await {
        Ok(stream) => stream,
        Err(e) => {
            error!("STOR data connection failed: {}", e);
            drop(file);
            policy.settle(session);
            control.reply_error(&e).await?;
            return Ok(Flow::Continue);
        }
    };

    info!("Receiving {:?} from {} at offset {}", path, control.peer_addr(), offset);
    session.transferring = true;
    let mut outcome = receive_stream(
        control,
        session.auth_state,
        &mut data,
        &mut *file,
        config.upload_buffer_size,
    )
    .await;

    // A REST upload ends the file at the last byte received; `-resume`
    // overwrites in place and keeps whatever follows.
    if in_place && !resume {
        if let Ok(TransferOutcome::Completed(received)) = outcome {
            if let Err(e) = file.set_len(offset + received).await {
                outcome = Ok(TransferOutcome::Failed(FtpError::StorageExceeded(e)));
            }
        }
    }

    drop(file);
    session.transferring = false;
    policy.settle(session);

    conclude(control, data, outcome?, "Transfer complete.").await
}
