//! Bind table and trigger vocabulary.
//!
//! A [`BindTable`] maps physical triggers (keys, pad buttons) to named logical
//! binds. Binds are remappable at runtime without disturbing whatever has been
//! hooked to them: callables attach to bind *names*, the table only decides
//! which trigger currently produces a name.
//!
//! The table is generic over [`Trigger`], so keyboard and pad maps share one
//! implementation. [`FileParser`] is the boundary for persisting a table; the
//! `fileparse` crate ships the JSON implementation.

mod bind;
mod error;
mod parser;
mod table;
mod trigger;

pub use bind::Bind;
pub use error::{Error, Result};
pub use parser::FileParser;
pub use table::{BindTable, TableData, UNASSIGNED_LABEL};
pub use trigger::{Key, Mods, PadButton, Trigger};
