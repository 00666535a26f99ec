use crate::TransportConfig;
use anyhow::{anyhow, ensure};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;
use url::Url;


mod local;
mod memory;
mod s3;


pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;
pub use s3::S3BlobStore;


pub type BlobStoreRef = Arc<dyn BlobStore + Send + Sync>;


#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UploadOutcome {
    Uploaded,
    /// An object under the same key was already there and was left untouched.
    AlreadyExists
}


/// Object store with named containers.
///
/// Errors returned from the upload methods are considered transient.
#[async_trait]
pub trait BlobStore {
    async fn create_container_if_missing(&self, container: &str) -> anyhow::Result<()>;

    /// Write-once upload.
    async fn upload_if_absent(&self, container: &str, key: &str, data: Bytes) -> anyhow::Result<UploadOutcome>;

    /// Unconditional upload, replaces whatever is stored under the key.
    async fn upload(&self, container: &str, key: &str, data: Bytes) -> anyhow::Result<()>;
}


/// Creates a blob store for `s3://bucket[/prefix]` urls or local directories.
pub async fn create_blob_store(dest: &str, transport: &TransportConfig) -> anyhow::Result<BlobStoreRef> {
    match Url::parse(dest) {
        Ok(u) => {
            if u.scheme() == "s3" {
                ensure!(!u.cannot_be_a_base(), "invalid s3 url - {}", dest);

                let bucket = u.host_str().ok_or_else(|| {
                    anyhow!("bucket is missing in {}", dest)
                })?;

                let root = u.path().trim_matches('/');

                let store = S3BlobStore::connect(bucket.to_string(), root.to_string(), transport).await;
                Ok(Arc::new(store))
            } else {
                anyhow::bail!("unsupported protocol - {}", u.scheme())
            }
        }
        Err(_) => {
            let path = Path::new(dest);
            if path.is_absolute() || path.is_relative() {
                Ok(Arc::new(LocalBlobStore::new(path)))
            } else {
                anyhow::bail!(format!("unsupported blob store destination - {dest}"))
            }
        }
    }
}
