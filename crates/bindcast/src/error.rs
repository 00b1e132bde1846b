//! Error types and result alias for the engine crate.
use std::{io, result::Result as StdResult};

use thiserror::Error;

/// Convenient result type for the engine crate.
pub type Result<T> = StdResult<T, Error>;

/// Unified error type for the dispatch engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Errors originating from the bind table layer.
    #[error("bind table error: {0}")]
    Table(#[from] bindmap::Error),

    /// I/O failure while loading or saving a binds file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The persistence collaborator rejected a binds file.
    #[error("binds file error: {0}")]
    Parser(#[source] Box<dyn std::error::Error + Send + Sync>),
}
