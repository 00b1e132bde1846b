//! Persistence boundary for bind tables.

use std::io::{Read, Write};

use crate::{table::BindTable, trigger::Trigger};

/// Encodes and decodes bind tables for persistence.
///
/// The table owns the logical shape transformation ([`BindTable::pack`] /
/// [`BindTable::unpack`]); implementations of this trait own the byte
/// encoding. The shipped JSON implementation lives in the `fileparse` crate.
pub trait FileParser<T: Trigger> {
    /// Error type produced by this parser.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Decode a table from a byte stream.
    fn load<R: Read>(&self, reader: R) -> Result<BindTable<T>, Self::Error>;

    /// Encode a table into a byte stream.
    fn save<W: Write>(&self, table: &BindTable<T>, writer: W) -> Result<(), Self::Error>;
}
