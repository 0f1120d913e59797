//! Advisory `flock(2)` locks scoped to a guard.
//!
//! The guard owns the locked handle and unlocks it when dropped, so early
//! returns release the lock as reliably as the success path does.

use std::io;
use std::ops::{Deref, DerefMut};
use std::os::unix::io::AsRawFd;

#[derive(Debug)]
pub struct FileLock<F: AsRawFd> {
    handle: F,
}

/// Outcome of a non-blocking lock attempt. `Contended` hands the handle back
/// untouched.
#[derive(Debug)]
pub enum TryLock<F: AsRawFd> {
    Acquired(FileLock<F>),
    Contended(F),
}

fn flock(fd: i32, operation: i32) -> io::Result<()> {
    // SAFETY: fd comes from a live handle owned by the caller for the whole call.
    let result = unsafe { libc::flock(fd, operation) };
    if result == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

impl<F: AsRawFd> FileLock<F> {
    /// Takes an exclusive lock without waiting.
    pub fn try_exclusive(handle: F) -> io::Result<TryLock<F>> {
        match flock(handle.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) {
            Ok(()) => Ok(TryLock::Acquired(FileLock { handle })),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(TryLock::Contended(handle)),
            Err(e) => Err(e),
        }
    }

    /// Takes an exclusive lock, waiting for other holders. Blocks the thread.
    pub fn exclusive(handle: F) -> io::Result<Self> {
        flock(handle.as_raw_fd(), libc::LOCK_EX)?;
        Ok(FileLock { handle })
    }
}

impl<F: AsRawFd> Deref for FileLock<F> {
    type Target = F;

    fn deref(&self) -> &F {
        &self.handle
    }
}

impl<F: AsRawFd> DerefMut for FileLock<F> {
    fn deref_mut(&mut self) -> &mut F {
        &mut self.handle
    }
}

impl<F: AsRawFd> Drop for FileLock<F> {
    fn drop(&mut self) {
        if let Err(e) = flock(self.handle.as_raw_fd(), libc::LOCK_UN) {
            log::warn!("Failed to release advisory lock: {}", e);
        }
    }
}
