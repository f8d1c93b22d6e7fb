/*
 * wepx_stream - stream writer (C2) plus the per-stream runtime state (§3) that the run
 * orchestrator keeps while driving a cycle, and the tail reader shared with the streaming server.
 */
#![allow(unused)]

pub mod errors;
pub mod path;
pub mod writer;
pub mod state;
pub mod tail;

pub use errors::{Result, WepxStreamError};
pub use path::{lock_path, stream_id, stream_path};
pub use writer::StreamWriter;
pub use state::{Stream, StreamState};
pub use tail::TailReader;
