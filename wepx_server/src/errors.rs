use thiserror::Error;

pub type Result<T> = std::result::Result<T, WepxServerError>;

#[derive(Error, Debug)]
pub enum WepxServerError {
    #[error("IO error {0}")]
    IOError(#[from] std::io::Error),

    #[error("stream error {0}")]
    StreamError(#[from] wepx_stream::WepxStreamError),

    #[error("websocket error {0}")]
    WsError(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("request path {0:?} escapes data root")]
    InvalidPath(String),
}
