use thiserror::Error;

#[derive(Debug, Error)]
pub enum SigncheckError {
    #[error("conversion failed: {0}")]
    Conversion(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid rules configuration: {0}")]
    Config(String),

    #[error("unknown sign method: {0}")]
    UnknownMethod(String),
}
