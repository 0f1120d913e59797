// Flat `user:password` file backing the credential store
use crate::core_auth::{CredentialCheck, CredentialStore, PasswdEntry};
use log::info;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Debug)]
pub struct PasswdFile {
    path: PathBuf,
    // Serializes appends from concurrent sessions within this process.
    write_lock: Mutex<()>,
}

impl PasswdFile {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    fn load_entries(&self) -> io::Result<Vec<PasswdEntry>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            // No file yet means no accounts yet.
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        Ok(content.lines().filter_map(PasswdEntry::from_line).collect())
    }
}

impl CredentialStore for PasswdFile {
    fn check(&self, username: &str, password: &str) -> io::Result<CredentialCheck> {
        let entries = self.load_entries()?;
        Ok(
            match entries.iter().find(|e| e.get_username() == username) {
                Some(entry) if entry.get_password() == password => CredentialCheck::Match,
                Some(_) => CredentialCheck::Mismatch,
                None => CredentialCheck::Unknown,
            },
        )
    }

    fn register(&self, username: &str, password: &str) -> io::Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "passwd lock poisoned"))?;

        // Another session may have registered the same name since `check`.
        match self.load_entries()?.iter().find(|e| e.get_username() == username) {
            Some(entry) if entry.get_password() == password => return Ok(()),
            Some(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("user {} already registered", username),
                ))
            }
            None => {}
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(PasswdEntry::new(username, password).to_line().as_bytes())?;
        file.flush()?;

        info!("Registered new user {} in {:?}", username, self.path);
        Ok(())
    }
}
