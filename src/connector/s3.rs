//! Object-store connector for the `s3://` scheme.
//!
//! Built on the `object_store` crate (the same concern `openobserve` in the
//! retrieval pack covers with it). `object_store`'s API is async; since the
//! rest of the engine is a synchronous, single-logical-thread pipeline
//! (spec.md §5), this connector owns a small dedicated Tokio runtime and
//! blocks on it, the way a sync facade over an async backend typically does.

use super::{strip_codec_extension, Connection, ReadSeek, StorageOptions};
use crate::error::EngineError;
use crate::schema::SchemaDoc;
use crate::uri::uri_path;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjPath;
use object_store::ObjectStore;
use once_cell::sync::OnceCell;
use std::io::Cursor;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::debug;

pub struct S3Connection {
    uri: String,
    bucket: String,
    prefix: String,
    storage_options: StorageOptions,
    store: Arc<dyn ObjectStore>,
    rt: Arc<Runtime>,
    schema: OnceCell<Arc<SchemaDoc>>,
}

fn split_bucket_prefix(path: &str) -> (String, String) {
    let mut parts = path.splitn(2, '/');
    let bucket = parts.next().unwrap_or_default().to_string();
    let prefix = parts.next().unwrap_or_default().trim_end_matches('/').to_string();
    (bucket, prefix)
}

impl S3Connection {
    pub fn new(uri: String, storage_options: StorageOptions) -> Result<S3Connection, EngineError> {
        let (bucket, prefix) = split_bucket_prefix(uri_path(&uri));
        let mut builder = AmazonS3Builder::from_env().with_bucket_name(&bucket);
        if let Some(region) = storage_options.get("region") {
            builder = builder.with_region(region);
        }
        if let Some(endpoint) = storage_options.get("endpoint") {
            builder = builder.with_endpoint(endpoint);
        }
        if let Some(key) = storage_options.get("key") {
            builder = builder.with_access_key_id(key);
        }
        if let Some(secret) = storage_options.get("secret") {
            builder = builder.with_secret_access_key(secret);
        }
        let store = builder
            .build()
            .map_err(|e| EngineError::io(format!("building s3 client for bucket '{bucket}': {e}")))?;
        let rt = Runtime::new().map_err(EngineError::from)?;
        Ok(S3Connection {
            uri,
            bucket,
            prefix,
            storage_options,
            store: Arc::new(store),
            rt: Arc::new(rt),
            schema: OnceCell::new(),
        })
    }

    fn with_child(&self, child_prefix: String) -> S3Connection {
        let uri = crate::uri::join(&format!("s3://{}", self.bucket), &child_prefix);
        S3Connection {
            uri,
            bucket: self.bucket.clone(),
            prefix: child_prefix,
            storage_options: self.storage_options.clone(),
            store: self.store.clone(),
            rt: self.rt.clone(),
            schema: OnceCell::new(),
        }
    }

    fn object_path(&self, name: &str) -> ObjPath {
        if self.prefix.is_empty() {
            ObjPath::from(name)
        } else {
            ObjPath::from(format!("{}/{}", self.prefix, name))
        }
    }
}

impl Connection for S3Connection {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn storage_options(&self) -> &StorageOptions {
        &self.storage_options
    }

    fn schema(&self) -> Result<Arc<SchemaDoc>, EngineError> {
        self.schema
            .get_or_try_init(|| {
                let path = self.object_path(".schema.json");
                debug!(target: "morganadb::connector", "loading schema at 's3://{}/{}'", self.bucket, path);
                let bytes = self.rt.block_on(async {
                    let result = self.store.get(&path).await?;
                    result.bytes().await
                })?;
                let text = String::from_utf8_lossy(&bytes);
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
        let prefix = if self.prefix.is_empty() { None } else { Some(ObjPath::from(self.prefix.clone())) };
        let metas = self.rt.block_on(async {
            use futures_core_wrapper::collect_list;
            collect_list(self.store.as_ref(), prefix.as_ref()).await
        })?;
        let mut out = Vec::new();
        for meta in metas {
            let full = meta.location.to_string();
            let name = full.rsplit('/').next().unwrap_or(&full).to_string();
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
        let child_prefix = if crate::uri::is_uri(&reference) {
            let (_, p) = split_bucket_prefix(uri_path(&reference));
            p
        } else if self.prefix.is_empty() {
            reference
        } else {
            format!("{}/{}", self.prefix, reference)
        };
        Ok(Arc::new(self.with_child(child_prefix)))
    }

    fn open_file(&self, filename: &str) -> Result<Box<dyn ReadSeek>, EngineError> {
        let path = self.object_path(filename);
        let bytes = self.rt.block_on(async {
            let result = self.store.get(&path).await?;
            result.bytes().await
        })?;
        Ok(Box::new(Cursor::new(bytes.to_vec())))
    }
}

/// Small local shim around `object_store::ObjectStore::list` to keep the
/// stream-collection details out of the connector's control flow.
mod futures_core_wrapper {
    use futures_util::TryStreamExt;
    use object_store::{path::Path as ObjPath, ObjectMeta, ObjectStore};

    pub async fn collect_list(
        store: &dyn ObjectStore,
        prefix: Option<&ObjPath>,
    ) -> Result<Vec<ObjectMeta>, object_store::Error> {
        store.list(prefix).try_collect().await
    }
}
