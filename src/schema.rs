//! Schema document model.
//! Parses the `.schema.json` document found at the root of every database
//! or table directory (spec.md §3/§6) into a typed `SchemaDoc`.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The four-ish scalar types a column or partition key may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Int,
    Float,
    String,
    Bool,
    Date,
    Datetime,
}

impl ColumnType {
    pub fn parse(s: &str) -> Option<ColumnType> {
        match s.to_ascii_lowercase().as_str() {
            "int" => Some(ColumnType::Int),
            "float" => Some(ColumnType::Float),
            "string" => Some(ColumnType::String),
            "bool" => Some(ColumnType::Bool),
            "date" => Some(ColumnType::Date),
            "datetime" => Some(ColumnType::Datetime),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::String => "string",
            ColumnType::Bool => "bool",
            ColumnType::Date => "date",
            ColumnType::Datetime => "datetime",
        }
    }
}

/// The codec tag recorded in a table's schema document (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CodecTag {
    Parquet,
    Csv,
}

impl CodecTag {
    pub fn parse(s: &str) -> Option<CodecTag> {
        match s.to_ascii_uppercase().as_str() {
            "PARQUET" => Some(CodecTag::Parquet),
            "CSV" => Some(CodecTag::Csv),
            _ => None,
        }
    }

    /// The filename extension this codec uses (spec.md §6).
    pub fn extension(&self) -> &'static str {
        match self {
            CodecTag::Parquet => "parquet.gzip",
            CodecTag::Csv => "csv",
        }
    }
}

/// A single named column or partition key entry as it appears on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDoc {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

/// A table reference entry inside a database schema document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableRefDoc {
    pub name: String,
    #[serde(rename = "ref")]
    pub reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "schema_type", rename_all = "lowercase")]
enum SchemaWire {
    Database {
        uri: String,
        name: String,
        tables: Vec<TableRefDoc>,
    },
    Table {
        uri: String,
        name: String,
        format: String,
        columns: Vec<FieldDoc>,
        partition_keys: Vec<FieldDoc>,
    },
}

/// A resolved (name, type) column or partition-key entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedField {
    pub name: String,
    pub ty: ColumnType,
}

/// The parsed schema document for a directory: either a database (mapping
/// table name to sub-URI) or a table (codec, columns, partitions).
#[derive(Debug, Clone)]
pub enum SchemaDoc {
    Database {
        name: String,
        tables: Vec<TableRefDoc>,
    },
    Table {
        name: String,
        codec: CodecTag,
        columns: Vec<TypedField>,
        partitions: Vec<TypedField>,
    },
}

impl SchemaDoc {
    pub fn is_database(&self) -> bool {
        matches!(self, SchemaDoc::Database { .. })
    }

    pub fn is_table(&self) -> bool {
        matches!(self, SchemaDoc::Table { .. })
    }

    /// Parse a `.schema.json` document body.
    pub fn parse(text: &str) -> Result<SchemaDoc, EngineError> {
        let wire: SchemaWire = serde_json::from_str(text)
            .map_err(|e| EngineError::schema(format!("invalid schema document: {e}")))?;
        match wire {
            SchemaWire::Database { name, tables, .. } => {
                let mut seen = HashSet::new();
                for t in &tables {
                    if !seen.insert(t.name.clone()) {
                        return Err(EngineError::schema(format!(
                            "duplicate table name '{}' in database schema",
                            t.name
                        )));
                    }
                }
                Ok(SchemaDoc::Database { name, tables })
            }
            SchemaWire::Table { name, format, columns, partition_keys, .. } => {
                let codec = CodecTag::parse(&format)
                    .ok_or_else(|| EngineError::schema(format!("unknown codec tag '{format}'")))?;
                let columns = to_typed_fields(&columns)?;
                let partitions = to_typed_fields(&partition_keys)?;

                let mut names: HashSet<&str> = HashSet::new();
                for f in columns.iter().chain(partitions.iter()) {
                    if !names.insert(f.name.as_str()) {
                        return Err(EngineError::schema(format!(
                            "column/partition name '{}' is not unique within table '{}'",
                            f.name, name
                        )));
                    }
                }

                Ok(SchemaDoc::Table { name, codec, columns, partitions })
            }
        }
    }

    pub fn table_ref(&self, table: &str) -> Result<&str, EngineError> {
        match self {
            SchemaDoc::Database { tables, .. } => tables
                .iter()
                .find(|t| t.name == table)
                .map(|t| t.reference.as_str())
                .ok_or_else(|| EngineError::resolve(format!("table '{table}' not found"))),
            SchemaDoc::Table { name, .. } => Err(EngineError::schema(format!(
                "schema for '{name}' is a table, not a database"
            ))),
        }
    }
}

fn to_typed_fields(fields: &[FieldDoc]) -> Result<Vec<TypedField>, EngineError> {
    fields
        .iter()
        .map(|f| {
            ColumnType::parse(&f.ty)
                .map(|ty| TypedField { name: f.name.clone(), ty })
                .ok_or_else(|| EngineError::schema(format!("unknown column type '{}'", f.ty)))
        })
        .collect()
}
