use thiserror::Error;

pub type Result<T> = std::result::Result<T, WepxStreamError>;

#[derive(Error, Debug)]
pub enum WepxStreamError {
    #[error("IO error {0}")]
    IOError(#[from] std::io::Error),

    #[error("codec error {0}")]
    CodecError(#[from] wepx_codec::WepxCodecError),
}
