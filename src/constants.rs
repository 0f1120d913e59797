// src/constants.rs

/// Longest accepted control line, terminator included.
pub const MAX_COMMAND_LENGTH: usize = 1024;

pub const USERNAME_REGEX: &str = r"^[^\s:\x00-\x1f\x7f]{1,64}$";
pub const MAX_PASSWORD_LENGTH: usize = 128;

pub const DEFAULT_PASV_PORT_MIN: u16 = 20000;
pub const DEFAULT_PASV_PORT_MAX: u16 = 65535;
/// How many random ports PASV tries before giving up with 421.
pub const PASV_BIND_ATTEMPTS: usize = 16;

pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;
pub const DEFAULT_DATA_TIMEOUT_SECS: u64 = 60;

pub const RESUME_FLAG: &str = "-resume";

pub const GREETING: &str = "FTP server ready.";

pub const WELCOME_BANNER: &[&str] = &[
    "Welcome to",
    " the jailftpd FTP archives",
    "",
    "This site is provided as a public service. Use in violation of any",
    "applicable laws is strictly prohibited. We make no guarantees, explicit",
    "or implicit, about the contents of this site. Use at your own risk.",
    "",
    "Guest login ok, access restrictions apply.",
];

pub const GOODBYE_BANNER: &[&str] = &["Thank you for using the FTP service.", "Goodbye."];
