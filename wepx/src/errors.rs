use thiserror::Error;

pub type Result<T> = std::result::Result<T, WepxError>;

#[derive(Error, Debug)]
pub enum WepxError {
    #[error("IO error {0}")]
    IOError(#[from] std::io::Error),

    #[error("model config error {0}")]
    ModelError(#[from] wepx_model::WepxModelError),

    #[error("run error {0}")]
    RunError(#[from] wepx_run::WepxRunError),
}
