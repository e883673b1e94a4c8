//! Unified error handling for the command-line tools.
//!
//! Library modules keep their own error types ([`SerialError`],
//! [`IdentityError`]); this type exists so the binaries can use `?` across
//! both without mapping by hand.

use thiserror::Error;

use crate::identity::IdentityError;
use crate::port::SerialError;

/// Any error the command-line tools can surface.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Serial(#[from] SerialError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
