//! PARQUET codec. The `.parquet.gzip` extension names gzip-compressed
//! parquet pages, not an outer gzip wrapper (the original engine's
//! `ParquetGzipIO.read` is a plain `pd.read_parquet`) — `ParquetReader`
//! decompresses transparently, same as the teacher's `storage/io.rs`.

use crate::connector::ReadSeek;
use crate::error::EngineError;
use polars::prelude::{DataFrame, ParquetReader, ParquetWriter, SerReader, SerWriter};
use std::io::{Cursor, Read};

pub fn read(mut reader: Box<dyn ReadSeek>) -> Result<DataFrame, EngineError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).map_err(EngineError::from)?;
    ParquetReader::new(Cursor::new(bytes)).finish().map_err(EngineError::from)
}

/// Encodes a result table as gzip-compressed parquet bytes, the engine's
/// default output codec (spec.md §6 "Invocation shim").
pub fn write(df: &mut DataFrame) -> Result<Vec<u8>, EngineError> {
    let mut buf = Vec::new();
    ParquetWriter::new(&mut buf)
        .with_compression(polars::prelude::ParquetCompression::Gzip(None))
        .finish(df)
        .map_err(EngineError::from)?;
    Ok(buf)
}
