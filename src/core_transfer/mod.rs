// Transfer engine shared by RETR, STOR and LIST
pub mod engine;

pub use engine::{conclude, receive_stream, send_stream, OffsetPolicy, TransferOutcome};
