//! Partition scanner (spec.md §4.5, second half): reads the pruned file set
//! for one table, injects partition-key columns, projects to the required
//! columns, renames to fullname, and concatenates into one per-table table.

use crate::connector::Connection;
use crate::error::EngineError;
use crate::plan::Table;
use crate::schema::{CodecTag, ColumnType, SchemaDoc};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

fn partition_segments(basename: &str, table_name: &str) -> HashMap<String, String> {
    let rest = basename.strip_prefix(table_name).unwrap_or(basename);
    let mut out = HashMap::new();
    for seg in rest.split('-').filter(|s| !s.is_empty()) {
        if let Some((k, v)) = seg.split_once('=') {
            out.insert(k.to_string(), v.to_string());
        }
    }
    out
}

fn injected_series(name: &str, ty: ColumnType, raw: &str, height: usize) -> Result<PlSeries, EngineError> {
    use crate::cast::{cast, Literal};
    let value = cast(raw, ty)?;
    let s = match value {
        Literal::Int(v) => Series::new(name.into(), vec![v; height]),
        Literal::Float(v) => Series::new(name.into(), vec![v; height]),
        Literal::Bool(v) => Series::new(name.into(), vec![v; height]),
        Literal::Str(v) => Series::new(name.into(), vec![v; height]),
        Literal::Date(v) => {
            let s = Series::new(name.into(), vec![v.format("%Y-%m-%d").to_string(); height]);
            s.cast(&DataType::Date).map_err(EngineError::from)?
        }
        Literal::Datetime(v) => {
            let s = Series::new(name.into(), vec![v.to_rfc3339(); height]);
            s.cast(&DataType::Datetime(TimeUnit::Milliseconds, None)).map_err(EngineError::from)?
        }
    };
    Ok(s)
}

type PlSeries = polars::prelude::Series;
type PlColumn = polars::prelude::Column;

/// Scans the pruned file set for `table`, returning the assembled DataFrame
/// and the full basenames (with extension) actually read.
pub fn scan(
    table: &Table,
    files: &[String],
    table_conn: &dyn Connection,
    schema: &SchemaDoc,
) -> Result<(DataFrame, Vec<String>), EngineError> {
    let (codec, partitions) = match schema {
        SchemaDoc::Table { codec, partitions, .. } => (*codec, partitions.clone()),
        SchemaDoc::Database { .. } => {
            return Err(EngineError::schema(format!("'{}' is a database, not a table", table.name)))
        }
    };
    let ext = codec_extension(codec);

    let required_names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
    let mut per_file = Vec::with_capacity(files.len());
    let mut read_files = Vec::with_capacity(files.len());

    for basename in files {
        let filename = format!("{basename}.{ext}");
        debug!(target: "morganadb::scan", "reading '{}' for table '{}'", filename, table.name);
        let reader = table_conn.open_file(&filename)?;
        let mut df = crate::codec::read(codec, reader)?;

        let segments = partition_segments(basename, &table.name);
        for key in &partitions {
            if !required_names.contains(&key.name.as_str()) {
                continue;
            }
            if let Some(raw) = segments.get(&key.name) {
                let series = injected_series(&key.name, key.ty, raw, df.height())?;
                df.with_column(series).map_err(EngineError::from)?;
            }
        }

        // Built by cloning the source series per required column rather than
        // a single select+rename pass, so the same underlying column can be
        // projected more than once under different fullnames (e.g. `id, id
        // AS other_id`) without one copy silently shadowing the other.
        let mut out_cols: Vec<PlColumn> = Vec::with_capacity(table.columns.len());
        for c in &table.columns {
            if let Ok(series) = df.column(c.name.as_str()) {
                let mut s = series.clone();
                s.rename(c.fullname().as_str().into());
                out_cols.push(s);
            }
        }
        df = DataFrame::new(out_cols).map_err(EngineError::from)?;

        per_file.push(df);
        read_files.push(filename);
    }

    let mut out = if per_file.is_empty() {
        empty_table(table)
    } else {
        let mut iter = per_file.into_iter();
        let mut acc = iter.next().unwrap();
        for df in iter {
            acc.vstack_mut(&df).map_err(EngineError::from)?;
        }
        acc
    };

    for c in &table.columns {
        if matches!(c.ty, ColumnType::Date | ColumnType::Datetime) {
            let name = c.fullname();
            if let Ok(col) = out.column(&name) {
                if col.dtype() == &DataType::String {
                    let target = if c.ty == ColumnType::Date {
                        DataType::Date
                    } else {
                        DataType::Datetime(TimeUnit::Milliseconds, None)
                    };
                    if let Ok(casted) = col.cast(&target) {
                        let _ = out.with_column(casted);
                    }
                }
            }
        }
    }

    Ok((out, read_files))
}

fn codec_extension(codec: CodecTag) -> &'static str {
    codec.extension()
}

fn empty_table(table: &Table) -> DataFrame {
    let cols: Vec<Column> = table
        .columns
        .iter()
        .map(|c| empty_series_for(&c.fullname(), c.ty))
        .collect();
    DataFrame::new(cols).unwrap_or_else(|_| DataFrame::empty())
}

fn empty_series_for(name: &str, ty: ColumnType) -> Column {
    match ty {
        ColumnType::Int => Series::new(name.into(), Vec::<i64>::new()).into(),
        ColumnType::Float => Series::new(name.into(), Vec::<f64>::new()).into(),
        ColumnType::Bool => Series::new(name.into(), Vec::<bool>::new()).into(),
        ColumnType::String => Series::new(name.into(), Vec::<String>::new()).into(),
        ColumnType::Date => Series::new(name.into(), Vec::<String>::new())
            .cast(&DataType::Date)
            .unwrap_or_else(|_| Series::new(name.into(), Vec::<String>::new()))
            .into(),
        ColumnType::Datetime => Series::new(name.into(), Vec::<String>::new())
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .unwrap_or_else(|_| Series::new(name.into(), Vec::<String>::new()))
            .into(),
    }
}
