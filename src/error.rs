//! Centralized error type for the eventlink umbrella crate.

use thiserror::Error;

/// Errors surfaced by the umbrella crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] eventlink_core::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
