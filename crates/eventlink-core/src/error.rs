//! Error types for eventlink-core.
//!
//! Only setup and lifecycle operations return errors. Failures on the render
//! thread are reported through sticky flags instead.

use thiserror::Error;

/// Setup-time failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Too many streams: requested {requested}, maximum is {max}")]
    TooManyStreams { requested: usize, max: usize },

    #[error("Invalid stream handle: {0}")]
    InvalidStream(usize),

    #[error("Render and control halves belong to different bridges")]
    MismatchedHalves,
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
