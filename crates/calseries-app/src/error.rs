use thiserror::Error;

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    RfcError(#[from] calseries_rfc::error::RfcError),

    #[error(transparent)]
    CoreError(#[from] calseries_core::error::CoreError),

    #[error("Invalid query window: {0}")]
    InvalidWindow(String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;
