// Jailed filesystem access: path resolution, advisory locks, listings
pub mod jail;
pub mod listing;
pub mod lock;

pub use jail::{normalize_virtual, resolve};
pub use lock::{FileLock, TryLock};
