use thiserror::Error;

pub type Result<T> = std::result::Result<T, WepxModelError>;

#[derive(Error, Debug)]
pub enum WepxModelError {
    #[error("IO error {0}")]
    IOError(#[from] std::io::Error),

    #[error("config error {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("invalid schedule config for model {0}: {1}")]
    InvalidSchedule(String, String),
}
