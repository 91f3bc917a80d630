//! CSV codec.

use crate::connector::ReadSeek;
use crate::error::EngineError;
use polars::prelude::{CsvReadOptions, SerReader};
use std::io::{Cursor, Read};

pub fn read(mut reader: Box<dyn ReadSeek>) -> Result<polars::prelude::DataFrame, EngineError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).map_err(EngineError::from)?;
    CsvReadOptions::default()
        .with_has_header(true)
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(EngineError::from)
}
