/*
 * wepx_server - the append-tail streaming server (C6, §4.6): watches `.wepx` stream files and
 * forwards new frame records to subscribed clients over a framed websocket transport.
 */
#![allow(unused)]

pub mod errors;
pub mod path;
pub mod server;

pub use errors::{Result, WepxServerError};
pub use path::resolve_stream_path;
pub use server::TailStreamingServer;
