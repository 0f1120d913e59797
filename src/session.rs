use std::net::SocketAddrV4;
use std::path::PathBuf;
use tokio::net::TcpListener;

/// Login progress. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    AwaitingUser,
    AwaitingPass,
    Authenticated,
}

/// The pending data-channel configuration set by PORT or PASV.
#[derive(Debug, Default)]
pub enum DataMode {
    #[default]
    None,
    /// Server connects out to the client.
    Active(SocketAddrV4),
    /// Server listens, client connects in.
    Passive { listener: TcpListener, port: u16 },
}

impl DataMode {
    pub fn is_configured(&self) -> bool {
        !matches!(self, DataMode::None)
    }
}

/// Per-connection state, owned by the connection's task alone.
#[derive(Debug)]
pub struct Session {
    pub auth_state: AuthState,
    pub username: Option<String>,
    pub root_dir: PathBuf,    // Canonical jail root
    pub current_dir: String,  // Virtual path, always normalized and starting with '/'
    pub data_mode: DataMode,
    pub transfer_offset: u64, // Set by REST
    pub transferring: bool,
}

impl Session {
    pub fn new(root_dir: PathBuf) -> Self {
        Self {
            auth_state: AuthState::AwaitingUser,
            username: None,
            root_dir,
            current_dir: String::from("/"),
            data_mode: DataMode::None,
            transfer_offset: 0,
            transferring: false,
        }
    }

    /// Physical path for a client-supplied name, jailed under `root_dir`.
    pub fn resolve(&self, component: &str) -> PathBuf {
        crate::core_fs::resolve(&self.root_dir, &self.current_dir, component)
    }

    /// Replaces the pending data mode; dropping a passive listener closes it.
    pub fn set_data_mode(&mut self, mode: DataMode) {
        self.data_mode = mode;
    }

    /// Hands out the pending data mode, leaving `None` behind.
    pub fn take_data_mode(&mut self) -> DataMode {
        std::mem::take(&mut self.data_mode)
    }
}
