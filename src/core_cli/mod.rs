use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "jailftpd", about = "A jailed FTP server written in Rust.")]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Control port, overriding the configuration file
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory served to clients, overriding the configuration file
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Enable verbose mode
    #[arg(short, long)]
    pub verbose: bool,
}
