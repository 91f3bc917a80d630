//! Storage connector abstraction (spec.md §4.1, §9 "Connector polymorphism").
//!
//! Two concrete variants share one behavioral contract: local filesystem and
//! a remote object store, selected by URI scheme. Schema documents are
//! loaded lazily and cached single-writer (first access populates,
//! subsequent accesses read), matching the teacher's `OnceCell`-guarded
//! lazy-init pattern used throughout `storage/`.

pub mod local;
pub mod s3;

use crate::error::EngineError;
use crate::schema::SchemaDoc;
use crate::uri::uri_scheme;
use std::collections::HashMap;
use std::io::{Read, Seek};
use std::sync::Arc;

/// Credentials/config forwarded to the object-store backend, mirroring the
/// `storage_options` dict threaded through the original engine's
/// `Connection` constructors.
pub type StorageOptions = HashMap<String, String>;

pub trait ReadSeek: Read + Seek + Send {}
impl<T: Read + Seek + Send> ReadSeek for T {}

/// A handle to a database or table directory at a URI. Provides schema
/// access, file listing, and file opening (spec.md §4.1).
pub trait Connection: Send + Sync {
    fn uri(&self) -> &str;
    fn storage_options(&self) -> &StorageOptions;

    /// Loads (and caches) the `.schema.json` document at this URI.
    fn schema(&self) -> Result<Arc<SchemaDoc>, EngineError>;

    /// Lists the data files in a table directory, stripped of their codec
    /// extension. Fails if this connection's schema is a database.
    fn list_files(&self) -> Result<Vec<String>, EngineError>;

    /// Lists the files whose name encodes a value for partition `column`.
    fn list_partition_files(&self, column: &str) -> Result<Vec<String>, EngineError>;

    /// Descends into a child table by name. Fails if this connection's
    /// schema is a table, or if `table` is not a listed child.
    fn access(&self, table: &str) -> Result<Arc<dyn Connection>, EngineError>;

    /// Opens a data file (by basename, including extension) for reading.
    fn open_file(&self, filename: &str) -> Result<Box<dyn ReadSeek>, EngineError>;
}

/// Builds a root `Connection` for the given URI/path, selecting the backend
/// by URI scheme (spec.md §6 "URI schemes"). Non-URI inputs are normalized
/// to `file://` relative to the current working directory.
pub fn connect(root: &str, storage_options: StorageOptions) -> Result<Arc<dyn Connection>, EngineError> {
    let cwd = std::env::current_dir().map_err(EngineError::from)?;
    let normalized = crate::uri::normalize_root(root, &cwd);
    match uri_scheme(&normalized).as_str() {
        "file" => Ok(Arc::new(local::FsConnection::new(normalized, storage_options))),
        "s3" => Ok(Arc::new(s3::S3Connection::new(normalized, storage_options)?)),
        other => Err(EngineError::io(format!("unsupported URI scheme '{other}'"))),
    }
}

/// Shared helper: derive the table-data-file basename (without extension)
/// for a directory listing entry, given the table's declared codec
/// extension (spec.md §6 data file name convention).
pub(crate) fn strip_codec_extension(filename: &str, extension: &str) -> Option<String> {
    filename.strip_suffix(&format!(".{extension}")).map(|s| s.to_string())
}
