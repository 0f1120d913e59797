pub mod core_auth;
pub mod passwd_file;

pub use core_auth::{CredentialCheck, CredentialStore, PasswdEntry};
pub use passwd_file::PasswdFile;
