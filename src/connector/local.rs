//! Local filesystem connector.

use super::{strip_codec_extension, Connection, ReadSeek, StorageOptions};
use crate::error::EngineError;
use crate::schema::SchemaDoc;
use crate::uri::uri_path;
use once_cell::sync::OnceCell;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

pub struct FsConnection {
    uri: String,
    path: PathBuf,
    storage_options: StorageOptions,
    schema: OnceCell<Arc<SchemaDoc>>,
}

impl FsConnection {
    pub fn new(uri: String, storage_options: StorageOptions) -> FsConnection {
        let path = PathBuf::from(uri_path(&uri));
        FsConnection { uri, path, storage_options, schema: OnceCell::new() }
    }

    fn schema_path(&self) -> PathBuf {
        self.path.join(".schema.json")
    }
}

impl Connection for FsConnection {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn storage_options(&self) -> &StorageOptions {
        &self.storage_options
    }

    fn schema(&self) -> Result<Arc<SchemaDoc>, EngineError> {
        self.schema
            .get_or_try_init(|| {
                let p = self.schema_path();
                debug!(target: "morganadb::connector", "loading schema at '{}'", p.display());
                let text = std::fs::read_to_string(&p)
                    .map_err(|e| EngineError::io(format!("reading schema '{}': {e}", p.display())))?;
                Ok(Arc::new(SchemaDoc::parse(&text)?))
            })
            .cloned()
    }

    fn list_files(&self) -> Result<Vec<String>, EngineError> {
        let schema = self.schema()?;
        let codec = match &*schema {
            SchemaDoc::Table { codec, .. } => *codec,
            SchemaDoc::Database { .. } => {
                return Err(EngineError::schema("cannot list files from a database schema"))
            }
        };
        let mut out = Vec::new();
        for entry in std::fs::read_dir(&self.path)
            .map_err(|e| EngineError::io(format!("listing '{}': {e}", self.path.display())))?
        {
            let entry = entry.map_err(EngineError::from)?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name == ".schema.json" {
                continue;
            }
            if let Some(stripped) = strip_codec_extension(&name, codec.extension()) {
                out.push(stripped);
            }
        }
        Ok(out)
    }

    fn list_partition_files(&self, column: &str) -> Result<Vec<String>, EngineError> {
        let needle = format!("-{column}=");
        Ok(self.list_files()?.into_iter().filter(|f| f.contains(&needle)).collect())
    }

    fn access(&self, table: &str) -> Result<Arc<dyn Connection>, EngineError> {
        let schema = self.schema()?;
        let reference = schema.table_ref(table)?.to_string();
        let child_uri = if crate::uri::is_uri(&reference) {
            reference
        } else {
            let child_path = self.path.join(&reference);
            crate::uri::path_to_uri(&child_path, "file")
        };
        Ok(Arc::new(FsConnection::new(child_uri, self.storage_options.clone())))
    }

    fn open_file(&self, filename: &str) -> Result<Box<dyn ReadSeek>, EngineError> {
        let p = self.path.join(filename);
        let f = File::open(&p).map_err(|e| EngineError::io(format!("opening '{}': {e}", p.display())))?;
        Ok(Box::new(f))
    }
}
