//! Error types and result alias for the bindmap crate.
use std::result::Result as StdResult;

use thiserror::Error;

/// Convenient result type used throughout this crate.
pub type Result<T> = StdResult<T, Error>;

/// Error variants produced by this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The named bind has never been generated in this table.
    #[error("unknown bind '{0}'")]
    UnknownBind(String),
    /// A packed trigger label could not be parsed back into a trigger.
    #[error("unknown trigger label '{0}'")]
    UnknownTrigger(String),
}
