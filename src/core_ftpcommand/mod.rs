// Here's the list of the FTP commands implemented
pub mod abor;
pub mod cwd;
pub mod list;
pub mod mkd;
pub mod pass;
pub mod pwd;
pub mod quit;
pub mod rest;
pub mod retr;
pub mod rmd;
pub mod size;
pub mod stor;
pub mod syst;
pub mod type_;
pub mod user;

// Parsing, state gating and dispatch
pub mod ftpcommand;
pub mod handlers;
