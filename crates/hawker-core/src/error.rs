//! Core error umbrella.

use thiserror::Error;

use crate::ports::{ProductStoreError, SynthesisError};

/// Errors crossing the core's public surface.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    ProductStore(#[from] ProductStoreError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("internal error: {0}")]
    Internal(String),
}
