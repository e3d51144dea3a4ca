use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("world document error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("terminal error: {0}")]
    Terminal(io::Error),
}

pub type Result<T> = std::result::Result<T, CanvasError>;
