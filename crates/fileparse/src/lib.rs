//! JSON persistence for bind tables.
//!
//! Implements the [`FileParser`] boundary from `bindmap` over serde_json. The
//! wire form is the packed table shape: an object keyed by trigger label
//! (`"null"` for the unassigned slot), each value a list of
//! `[bind_name, mods_bits]` pairs.
//!
//! ```json
//! {"space": [["advance", null], ["burst", 4]], "null": [["spare", null]]}
//! ```

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
    result::Result as StdResult,
};

use bindmap::{BindTable, FileParser, TableData, Trigger};
use thiserror::Error;
use tracing::info;

/// Convenient result type used throughout this crate.
pub type Result<T> = StdResult<T, Error>;

/// Error variants produced while loading or saving a binds file.
#[derive(Debug, Error)]
pub enum Error {
    /// Filesystem or stream failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The byte stream is not the expected JSON shape.
    #[error("malformed binds file: {0}")]
    Json(#[from] serde_json::Error),
    /// The decoded shape references triggers this table cannot represent.
    #[error(transparent)]
    Table(#[from] bindmap::Error),
}

/// JSON codec for packed bind tables.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonParser;

impl JsonParser {
    /// Load a table from a file path.
    pub fn load_path<T: Trigger>(&self, path: impl AsRef<Path>) -> Result<BindTable<T>> {
        let path = path.as_ref();
        let table = FileParser::<T>::load(self, BufReader::new(File::open(path)?))?;
        info!(path = %path.display(), binds = table.len(), "loaded binds file");
        Ok(table)
    }

    /// Save a table to a file path, replacing any existing contents.
    pub fn save_path<T: Trigger>(&self, table: &BindTable<T>, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        FileParser::<T>::save(self, table, BufWriter::new(File::create(path)?))?;
        info!(path = %path.display(), binds = table.len(), "saved binds file");
        Ok(())
    }
}

impl<T: Trigger> FileParser<T> for JsonParser {
    type Error = Error;

    fn load<R: Read>(&self, reader: R) -> Result<BindTable<T>> {
        let data: TableData = serde_json::from_reader(reader)?;
        Ok(BindTable::unpack(&data)?)
    }

    fn save<W: Write>(&self, table: &BindTable<T>, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, &table.pack())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bindmap::{Key, Mods};

    use super::*;

    #[test]
    fn round_trips_through_bytes() {
        let mut table: BindTable<Key> = BindTable::new();
        table.generate("advance", Some(Key::SPACE), None);
        table.generate("burst", Some(Key::SPACE), Some(Mods::ALT));
        table.generate("spare", None, Some(Mods::empty()));

        let parser = JsonParser;
        let mut buf = Vec::new();
        FileParser::<Key>::save(&parser, &table, &mut buf).unwrap();
        let restored: BindTable<Key> = FileParser::load(&parser, buf.as_slice()).unwrap();

        assert_eq!(restored.bound_trigger("advance").unwrap(), (Some(Key::SPACE), None));
        assert_eq!(
            restored.bound_trigger("burst").unwrap(),
            (Some(Key::SPACE), Some(Mods::ALT))
        );
        assert_eq!(
            restored.bound_trigger("spare").unwrap(),
            (None, Some(Mods::empty()))
        );
    }

    #[test]
    fn wire_shape_uses_labels_and_null_slot() {
        let mut table: BindTable<Key> = BindTable::new();
        table.generate("advance", Some(Key::SPACE), None);
        table.generate("spare", None, None);

        let json = serde_json::to_value(table.pack()).unwrap();
        assert_eq!(json["space"][0][0], "advance");
        assert!(json["space"][0][1].is_null());
        assert_eq!(json["null"][0][0], "spare");
    }

    #[test]
    fn rejects_malformed_input() {
        let parser = JsonParser;
        let result: Result<BindTable<Key>> = FileParser::load(&parser, &b"[1, 2, 3]"[..]);
        assert!(matches!(result, Err(Error::Json(_))));
    }
}
