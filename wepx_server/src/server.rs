/*
 * the tail-streaming server (C6, §4.6): accepts a client connection bound to a stream path, tails
 * the corresponding `.wepx` file with [`wepx_stream::TailReader`], and forwards every complete
 * record as a framed binary message (§6 wire format). Grounded on the teacher's websocket
 * plumbing (`odin_common::ws` - `accept_async`/select-loop over an incoming/outgoing pair) and on
 * the pack's `rerun-io-rerun` comms server (the closest example of a pure tail/broadcast
 * websocket server rather than a request/response API), adapted from log-message broadcast to
 * per-connection file tailing since each client here reads its own stream from its own offset
 * rather than sharing one global log.
 */
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};

use wepx_stream::TailReader;

use crate::errors::Result;
use crate::path::resolve_stream_path;

/// how often the server checks a stream file for new records when nothing new was found on the
/// previous iteration (§4.6: "sleep briefly (~100ms) only when no new frames were sent").
const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct TailStreamingServer {
    listener: TcpListener,
    data_root: PathBuf,
}

impl TailStreamingServer {
    pub async fn bind(addr: &str, data_root: impl Into<PathBuf>) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let data_root = data_root.into();
        info!(addr, data_root = %data_root.display(), "wepx tail-streaming server listening");
        Ok(TailStreamingServer { listener, data_root })
    }

    pub fn local_addr(&self) -> Result<std::net::SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// accept connections forever; each gets its own tailing task (§4.6 is per-connection: one
    /// offset, one stream file, independent of every other client).
    pub async fn serve(self) -> Result<()> {
        loop {
            let (tcp_stream, peer) = self.listener.accept().await?;
            let data_root = self.data_root.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_connection(tcp_stream, &data_root).await {
                    warn!(%peer, error = %e, "tail connection ended with error");
                }
            });
        }
    }
}

/// the handshake callback captures the request path so the rest of the connection can be plain
/// binary frames - after the upgrade tungstenite no longer carries a notion of "URL".
fn capture_request_path() -> (impl FnMut(&Request, Response) -> std::result::Result<Response, tokio_tungstenite::tungstenite::handshake::server::ErrorResponse>, Arc<Mutex<String>>) {
    let captured = Arc::new(Mutex::new(String::new()));
    let cb_captured = captured.clone();
    let callback = move |req: &Request, resp: Response| {
        *cb_captured.lock().unwrap() = req.uri().path().to_string();
        Ok(resp)
    };
    (callback, captured)
}

async fn handle_connection(tcp_stream: TcpStream, data_root: &Path) -> Result<()> {
    let (callback, captured_path) = capture_request_path();
    let ws_stream = accept_hdr_async(tcp_stream, callback).await?;
    let request_path = captured_path.lock().unwrap().clone();
    let stream_path = resolve_stream_path(data_root, &request_path)?;

    info!(path = %stream_path.display(), "client subscribed to stream");

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let mut tail = TailReader::new(&stream_path);

    loop {
        let records = tail.poll()?;
        if records.is_empty() {
            tokio::select! {
                incoming = ws_receiver.next() => {
                    match incoming {
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => {} // clients never send anything meaningful; ignore
                        Some(Err(e)) => return Err(e.into()),
                    }
                }
                _ = tokio::time::sleep(POLL_INTERVAL) => {}
            }
        } else {
            for record in &records {
                let mut out = Vec::with_capacity(2 + record.payload.len());
                out.push(0x00u8); // stream_id byte, always 0x00 per §6
                out.push(record.frame_type as u8);
                out.extend_from_slice(&record.payload);
                ws_sender.send(Message::Binary(out.into())).await?;
            }
        }
    }
    Ok(())
}
