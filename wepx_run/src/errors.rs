use thiserror::Error;

pub type Result<T> = std::result::Result<T, WepxRunError>;

#[derive(Error, Debug)]
pub enum WepxRunError {
    #[error("IO error {0}")]
    IOError(#[from] std::io::Error),

    #[error("http error {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("model error {0}")]
    ModelError(#[from] wepx_model::WepxModelError),

    #[error("raster error {0}")]
    RasterError(#[from] wepx_raster::WepxRasterError),

    #[error("codec error {0}")]
    CodecError(#[from] wepx_codec::WepxCodecError),

    #[error("stream error {0}")]
    StreamError(#[from] wepx_stream::WepxStreamError),

    #[error("formula error: {0}")]
    FormulaError(String),

    #[error("download failed: {0}")]
    DownloadFailed(String),
}
