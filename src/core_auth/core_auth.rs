use std::io;

/// Result of looking a (user, password) pair up in a credential store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialCheck {
    Match,
    Mismatch,
    Unknown,
}

/// Account lookup consulted by PASS. Unknown users get registered on first
/// login, so stores must support appending.
pub trait CredentialStore: Send + Sync {
    fn check(&self, username: &str, password: &str) -> io::Result<CredentialCheck>;
    /// Adds the account. Succeeds without a second entry if the same pair was
    /// registered meanwhile; fails if the name now has another password.
    fn register(&self, username: &str, password: &str) -> io::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswdEntry {
    username: String,
    password: String,
}

impl PasswdEntry {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Parses `user:password`. The first colon separates, so passwords may
    /// contain colons. Blank lines and `#` comments yield `None`.
    pub fn from_line(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(&['\r', '\n'][..]);
        if line.trim().is_empty() || line.starts_with('#') {
            return None;
        }
        let (username, password) = line.split_once(':')?;
        if username.is_empty() {
            return None;
        }
        Some(Self::new(username, password))
    }

    pub fn to_line(&self) -> String {
        format!("{}:{}\n", self.username, self.password)
    }

    pub fn get_password(&self) -> &str {
        &self.password
    }

    pub fn get_username(&self) -> &str {
        &self.username
    }
}
