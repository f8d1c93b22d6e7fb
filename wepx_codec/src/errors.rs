use thiserror::Error;

pub type Result<T> = std::result::Result<T, WepxCodecError>;

#[derive(Error, Debug)]
pub enum WepxCodecError {
    #[error("IO error {0}")]
    IOError(#[from] std::io::Error),

    #[error("JSON error {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("dimension mismatch: stream is {stream_w}x{stream_h}, frame is {frame_w}x{frame_h}")]
    DimensionMismatch { stream_w: u32, stream_h: u32, frame_w: u32, frame_h: u32 },

    #[error("truncated record: {0}")]
    Truncated(String),

    #[error("unknown frame type {0}")]
    UnknownFrameType(u8),

    #[error("P-frame decoded before any I-frame established stream metadata")]
    NoMetaYet,

    #[error("codec arithmetic error: {0}")]
    Arithmetic(String),
}
