//! Data file codecs (spec.md §6): PARQUET (`.parquet.gzip`) and CSV (`.csv`).
//! Both read into a `polars::DataFrame`, the shared in-memory shape every
//! later pipeline stage (prune/scan/join/rowfilter) operates on, the way the
//! teacher's `storage/io.rs` reads every chunk into a `DataFrame` via
//! `ParquetReader`.

pub mod csv;
pub mod parquet;

use crate::connector::ReadSeek;
use crate::error::EngineError;
use crate::schema::CodecTag;
use polars::prelude::DataFrame;

/// Reads a single data file through the codec named by `codec`.
pub fn read(codec: CodecTag, reader: Box<dyn ReadSeek>) -> Result<DataFrame, EngineError> {
    match codec {
        CodecTag::Parquet => parquet::read(reader),
        CodecTag::Csv => csv::read(reader),
    }
}

/// Encodes a result table in the engine's default output codec (PARQUET,
/// spec.md §6 "Invocation shim").
pub fn write_default(df: &mut DataFrame) -> Result<Vec<u8>, EngineError> {
    parquet::write(df)
}
