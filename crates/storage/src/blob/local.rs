use crate::blob::{BlobStore, UploadOutcome};
use anyhow::{ensure, Context};
use async_trait::async_trait;
use bytes::Bytes;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};


/// Blob store over a local directory, containers are subdirectories.
///
/// Objects are first written to a temporary file and then published
/// under their final name, readers never observe partial objects.
pub struct LocalBlobStore {
    root: PathBuf
}


impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn object_path(&self, container: &str, key: &str) -> PathBuf {
        self.root.join(container).join(key)
    }

    fn container_dir(&self, container: &str) -> anyhow::Result<PathBuf> {
        let dir = self.root.join(container);
        ensure!(dir.is_dir(), "container '{}' does not exist", container);
        Ok(dir)
    }
}


#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn create_container_if_missing(&self, container: &str) -> anyhow::Result<()> {
        let dir = self.root.join(container);
        tokio::fs::create_dir_all(&dir).await.with_context(|| {
            format!("failed to create {}", dir.display())
        })?;
        Ok(())
    }

    async fn upload_if_absent(&self, container: &str, key: &str, data: Bytes) -> anyhow::Result<UploadOutcome> {
        let dir = self.container_dir(container)?;
        let dest = dir.join(key);
        tokio::task::spawn_blocking(move || {
            let tmp = write_temp(&dir, &data)?;
            match std::fs::hard_link(tmp.path(), &dest) {
                Ok(_) => Ok(UploadOutcome::Uploaded),
                Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(UploadOutcome::AlreadyExists),
                Err(err) => Err(err).with_context(|| format!("failed to publish {}", dest.display()))
            }
        }).await?
    }

    async fn upload(&self, container: &str, key: &str, data: Bytes) -> anyhow::Result<()> {
        let dir = self.container_dir(container)?;
        let dest = dir.join(key);
        tokio::task::spawn_blocking(move || {
            let tmp = write_temp(&dir, &data)?;
            tmp.persist(&dest).with_context(|| {
                format!("failed to publish {}", dest.display())
            })?;
            Ok::<_, anyhow::Error>(())
        }).await?
    }
}


fn write_temp(dir: &Path, data: &[u8]) -> anyhow::Result<tempfile::NamedTempFile> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}
