// Error taxonomy shared by the command handlers

pub mod error;

pub use error::FtpError;
