use shared::AppError;
use thiserror::Error;

/// Startup and listener failures (request errors use `AppError`)
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("initialization failed: {0}")]
    Init(#[from] AppError),
}

pub type Result<T> = std::result::Result<T, ServerError>;
