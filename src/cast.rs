//! Literal casting: turns the verbatim text carried by an ENTITY token into
//! a typed value, dispatching on a column's declared TYPE (spec.md §3
//! "Partition file name" / §4.7 "Row filter evaluator"). Mirrors the
//! original engine's `utils/types.casting_functions` dispatch table, but as
//! a single typed value rather than a bag of ad-hoc lambdas.

use crate::error::EngineError;
use crate::schema::ColumnType;
use chrono::{DateTime, NaiveDate, Utc};
use std::cmp::Ordering;

/// A literal value cast to one of the engine's runtime types. Variants only
/// compare meaningfully against the same variant; callers only ever compare
/// values already known to share a column's declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Date(NaiveDate),
    Datetime(DateTime<Utc>),
}

impl Literal {
    pub fn partial_cmp_same_type(&self, other: &Literal) -> Option<Ordering> {
        match (self, other) {
            (Literal::Int(a), Literal::Int(b)) => a.partial_cmp(b),
            (Literal::Float(a), Literal::Float(b)) => a.partial_cmp(b),
            (Literal::Bool(a), Literal::Bool(b)) => a.partial_cmp(b),
            (Literal::Str(a), Literal::Str(b)) => a.partial_cmp(b),
            (Literal::Date(a), Literal::Date(b)) => a.partial_cmp(b),
            (Literal::Datetime(a), Literal::Datetime(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Strips one layer of surrounding quotes (`'...'` or `"..."`), if present.
fn unquote(text: &str) -> &str {
    let b = text.as_bytes();
    if b.len() >= 2 && ((b[0] == b'\'' && b[b.len() - 1] == b'\'') || (b[0] == b'"' && b[b.len() - 1] == b'"')) {
        &text[1..text.len() - 1]
    } else {
        text
    }
}

/// Casts verbatim literal text to the runtime type named by `ty`.
pub fn cast(text: &str, ty: ColumnType) -> Result<Literal, EngineError> {
    let raw = unquote(text.trim());
    match ty {
        ColumnType::Int => raw
            .parse::<i64>()
            .map(Literal::Int)
            .map_err(|_| EngineError::ty(format!("cannot cast '{raw}' to int"))),
        ColumnType::Float => raw
            .parse::<f64>()
            .map(Literal::Float)
            .map_err(|_| EngineError::ty(format!("cannot cast '{raw}' to float"))),
        ColumnType::Bool => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Literal::Bool(true)),
            "false" | "0" => Ok(Literal::Bool(false)),
            _ => Err(EngineError::ty(format!("cannot cast '{raw}' to bool"))),
        },
        ColumnType::String => Ok(Literal::Str(raw.to_string())),
        ColumnType::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Literal::Date)
            .map_err(|_| EngineError::ty(format!("cannot cast '{raw}' to date"))),
        ColumnType::Datetime => DateTime::parse_from_rfc3339(raw)
            .map(|dt| Literal::Datetime(dt.with_timezone(&Utc)))
            .map_err(|_| EngineError::ty(format!("cannot cast '{raw}' to datetime"))),
    }
}
