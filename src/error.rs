//! Error types for inkpot operations.

use thiserror::Error;

/// Errors from loading stylesheets and configuring the inliner.
///
/// Inlining itself never fails: malformed CSS and HTML are recovered from.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("stylesheet not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
