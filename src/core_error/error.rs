// Every failure a command handler can report on the control channel
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FtpError {
    // Protocol
    #[error("login required")]
    LoginRequired,

    #[error("command not implemented: {0}")]
    NotImplemented(String),

    #[error("parameter not implemented: {0}")]
    ParameterNotImplemented(String),

    #[error("command rejected while a transfer is running")]
    BusyTransferring,

    #[error("command line too long")]
    LineTooLong,

    #[error("missing argument for {0}")]
    MissingArgument(&'static str),

    // Authentication
    #[error("login incorrect for user {0}")]
    LoginIncorrect(String),

    #[error("credential store lookup failed: {0}")]
    CredentialLookup(#[source] io::Error),

    #[error("failed to register user {0}: {1}")]
    RegistrationFailed(String, #[source] io::Error),

    // Validation
    #[error("invalid user name")]
    InvalidUserName,

    #[error("invalid password")]
    InvalidPassword,

    #[error("invalid PORT argument: {0}")]
    InvalidPortArgument(String),

    #[error("invalid restart offset: {0}")]
    InvalidOffset(String),

    #[error("offset {offset} exceeds file length {length}")]
    OffsetBeyondEnd { offset: u64, length: u64 },

    #[error("invalid directory name")]
    InvalidDirectoryName,

    // Data channel
    #[error("no data connection mode configured")]
    NoDataMode,

    #[error("upload attempted without PORT or PASV")]
    UsePortOrPasv,

    #[error("failed to open data connection: {0}")]
    DataConnection(#[source] io::Error),

    #[error("timed out waiting for data connection")]
    DataConnectionTimeout,

    #[error("failed to {0} passive socket: {1}")]
    PassiveSetup(&'static str, #[source] io::Error),

    #[error("no IPv4 address to announce for passive mode")]
    PassiveAddress,

    // Transfer
    #[error("failed to send data: {0}")]
    SendFailed(#[source] io::Error),

    #[error("failed to receive data: {0}")]
    ReceiveFailed(#[source] io::Error),

    #[error("failed to read local file: {0}")]
    ReadFailed(#[source] io::Error),

    #[error("failed to write local file: {0}")]
    StorageExceeded(#[source] io::Error),

    #[error("transfer aborted by client")]
    Aborted,

    // Filesystem
    #[error("file not found")]
    FileNotFound,

    #[error("not a regular file")]
    NotAFile,

    #[error("failed to open file: {0}")]
    OpenFailed(#[source] io::Error),

    #[error("file is locked by another writer")]
    FileLocked,

    #[error("directory does not exist")]
    DirectoryNotFound,

    #[error("failed to change directory")]
    ChangeDirFailed,

    #[error("failed to create directory: {0}")]
    CreateDirFailed(#[source] io::Error),

    #[error("failed to lock directory: {0}")]
    DirectoryLockFailed(#[source] io::Error),

    #[error("failed to remove directory: {0}")]
    RemoveDirFailed(#[source] io::Error),

    #[error("refusing to remove the root directory")]
    RootDirectory,

    #[error("failed to list directory: {0}")]
    ListFailed(#[source] io::Error),
}

impl FtpError {
    pub fn code(&self) -> u16 {
        match self {
            FtpError::LoginRequired | FtpError::LoginIncorrect(_) => 530,
            FtpError::NotImplemented(_) => 502,
            FtpError::ParameterNotImplemented(_) => 504,
            FtpError::BusyTransferring => 425,
            FtpError::LineTooLong => 500,
            FtpError::MissingArgument(_)
            | FtpError::InvalidUserName
            | FtpError::InvalidPassword
            | FtpError::InvalidPortArgument(_)
            | FtpError::InvalidOffset(_)
            | FtpError::OffsetBeyondEnd { .. }
            | FtpError::InvalidDirectoryName => 501,
            FtpError::NoDataMode
            | FtpError::UsePortOrPasv
            | FtpError::DataConnection(_)
            | FtpError::DataConnectionTimeout => 425,
            FtpError::PassiveSetup(..) | FtpError::PassiveAddress => 421,
            FtpError::SendFailed(_) | FtpError::ReceiveFailed(_) | FtpError::Aborted => 426,
            FtpError::StorageExceeded(_) => 552,
            FtpError::CredentialLookup(_) | FtpError::ReadFailed(_) | FtpError::ListFailed(_) => {
                451
            }
            FtpError::RegistrationFailed(..)
            | FtpError::FileNotFound
            | FtpError::NotAFile
            | FtpError::OpenFailed(_)
            | FtpError::FileLocked
            | FtpError::DirectoryNotFound
            | FtpError::ChangeDirFailed
            | FtpError::CreateDirFailed(_)
            | FtpError::DirectoryLockFailed(_)
            | FtpError::RemoveDirFailed(_)
            | FtpError::RootDirectory => 550,
        }
    }

    /// The reply line for this error, without the trailing CRLF.
    pub fn to_ftp_response(&self) -> String {
        let text = match self {
            FtpError::LoginRequired => "Please login with USER and PASS.".to_string(),
            FtpError::NotImplemented(verb) => format!("Command not implemented: {}", verb),
            FtpError::ParameterNotImplemented(_) => {
                "Command not implemented for that parameter.".to_string()
            }
            FtpError::BusyTransferring => "Unable to process command during transfer.".to_string(),
            FtpError::LineTooLong => "Command line too long.".to_string(),
            FtpError::MissingArgument(_) => {
                "Syntax error in parameters or arguments.".to_string()
            }
            FtpError::LoginIncorrect(_) => "Login incorrect.".to_string(),
            FtpError::RegistrationFailed(..) => "Failed to create new user.".to_string(),
            FtpError::InvalidUserName => "Invalid user name.".to_string(),
            FtpError::InvalidPassword => "Invalid password.".to_string(),
            FtpError::InvalidPortArgument(_) => "Syntax error in PORT parameters.".to_string(),
            FtpError::InvalidOffset(_) | FtpError::OffsetBeyondEnd { .. } => {
                "Invalid offset.".to_string()
            }
            FtpError::InvalidDirectoryName => "Invalid directory name.".to_string(),
            FtpError::NoDataMode
            | FtpError::DataConnection(_)
            | FtpError::DataConnectionTimeout => "Can't open data connection.".to_string(),
            FtpError::UsePortOrPasv => "Use PORT or PASV first.".to_string(),
            FtpError::PassiveSetup(stage, _) => format!("Failed to {} PASV socket.", stage),
            FtpError::PassiveAddress => "Failed to get server IP address.".to_string(),
            FtpError::SendFailed(_) | FtpError::ReceiveFailed(_) | FtpError::Aborted => {
                "Connection closed; transfer aborted.".to_string()
            }
            FtpError::StorageExceeded(_) => {
                "Requested file action aborted. Exceeded storage allocation.".to_string()
            }
            FtpError::CredentialLookup(_) | FtpError::ReadFailed(_) => {
                "Requested action aborted. Local error in processing.".to_string()
            }
            FtpError::ListFailed(_) => "Failed to list directory.".to_string(),
            FtpError::FileNotFound => "File not found or access denied.".to_string(),
            FtpError::NotAFile => "Not a regular file.".to_string(),
            FtpError::OpenFailed(_) => "Failed to open file.".to_string(),
            FtpError::FileLocked => {
                "File is currently being written by another client.".to_string()
            }
            FtpError::DirectoryNotFound => "Directory does not exist.".to_string(),
            FtpError::ChangeDirFailed => "Failed to change directory.".to_string(),
            FtpError::CreateDirFailed(_) => "Failed to create directory.".to_string(),
            FtpError::DirectoryLockFailed(_) => "Failed to lock directory.".to_string(),
            FtpError::RemoveDirFailed(_) => "Failed to remove directory.".to_string(),
            FtpError::RootDirectory => "Cannot remove the root directory.".to_string(),
        };
        format!("{} {}", self.code(), text)
    }
}
