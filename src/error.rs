//! Unified application error model.
//! This module provides the error enum shared by every pipeline stage, plus
//! helper mappers to the invocation shim's HTTP-style status codes.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineError {
    Parse { code: String, message: String },
    Resolve { code: String, message: String },
    NotImplemented { code: String, message: String },
    Schema { code: String, message: String },
    Type { code: String, message: String },
    Io { code: String, message: String },
}

impl EngineError {
    pub fn code_str(&self) -> &str {
        match self {
            EngineError::Parse { code, .. }
            | EngineError::Resolve { code, .. }
            | EngineError::NotImplemented { code, .. }
            | EngineError::Schema { code, .. }
            | EngineError::Type { code, .. }
            | EngineError::Io { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            EngineError::Parse { message, .. }
            | EngineError::Resolve { message, .. }
            | EngineError::NotImplemented { message, .. }
            | EngineError::Schema { message, .. }
            | EngineError::Type { message, .. }
            | EngineError::Io { message, .. } => message.as_str(),
        }
    }

    pub fn parse<S: Into<String>>(msg: S) -> Self {
        EngineError::Parse { code: "parse_error".into(), message: msg.into() }
    }
    pub fn resolve<S: Into<String>>(msg: S) -> Self {
        EngineError::Resolve { code: "resolve_error".into(), message: msg.into() }
    }
    pub fn not_implemented<S: Into<String>>(msg: S) -> Self {
        EngineError::NotImplemented { code: "not_implemented".into(), message: msg.into() }
    }
    pub fn schema<S: Into<String>>(msg: S) -> Self {
        EngineError::Schema { code: "schema_error".into(), message: msg.into() }
    }
    pub fn ty<S: Into<String>>(msg: S) -> Self {
        EngineError::Type { code: "type_error".into(), message: msg.into() }
    }
    pub fn io<S: Into<String>>(msg: S) -> Self {
        EngineError::Io { code: "io_error".into(), message: msg.into() }
    }

    /// Map to the status code taxonomy in spec.md §6/§7.
    pub fn http_status(&self) -> u16 {
        match self {
            EngineError::Parse { .. } => 400,
            EngineError::Resolve { .. } => 404,
            EngineError::NotImplemented { .. } => 500,
            EngineError::Schema { .. } => 400,
            EngineError::Type { .. } => 400,
            EngineError::Io { .. } => 500,
        }
    }
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for EngineError {}

pub type EngineResult<T> = Result<T, EngineError>;

/// Internal helpers build on `anyhow::Result`; at each pipeline boundary the
/// error is classified into the typed taxonomy. Errors already tagged as an
/// `EngineError` round-trip their original variant; anything else is treated
/// as an I/O failure, since by the time it reaches this conversion it has
/// already passed lexing/resolving/casting without being rejected there.
impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<EngineError>() {
            Ok(tagged) => tagged,
            Err(err) => EngineError::io(err.to_string()),
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::io(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::schema(err.to_string())
    }
}

impl From<polars::prelude::PolarsError> for EngineError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        EngineError::io(err.to_string())
    }
}

impl From<object_store::Error> for EngineError {
    fn from(err: object_store::Error) -> Self {
        EngineError::io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping() {
        assert_eq!(EngineError::parse("bad").http_status(), 400);
        assert_eq!(EngineError::resolve("missing").http_status(), 404);
        assert_eq!(EngineError::not_implemented("nope").http_status(), 500);
        assert_eq!(EngineError::schema("bad schema").http_status(), 400);
        assert_eq!(EngineError::ty("bad cast").http_status(), 400);
        assert_eq!(EngineError::io("disk").http_status(), 500);
    }

    #[test]
    fn anyhow_round_trips_tagged_errors() {
        let tagged: anyhow::Error = anyhow::Error::new(EngineError::resolve("unknown table"));
        let back: EngineError = tagged.into();
        assert!(matches!(back, EngineError::Resolve { .. }));
    }
}
