use anyhow::Context;
use sqd_primitives::Cursor;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};


#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum CheckpointStream {
    Blocks,
    Transactions
}


impl CheckpointStream {
    /// Stream name, `None` for the default stream.
    pub fn name(&self) -> Option<&'static str> {
        match self {
            CheckpointStream::Blocks => None,
            CheckpointStream::Transactions => Some("tx")
        }
    }
}


/// File backed cursor of one ingestion stream.
///
/// The default stream lives in the progress file itself, a named stream
/// in `<progress file>-<name>`.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf
}


impl CheckpointStore {
    pub fn new(progress_file: impl AsRef<Path>, stream: CheckpointStream) -> Self {
        let progress_file = progress_file.as_ref();
        let path = match stream.name() {
            None => progress_file.to_path_buf(),
            Some(name) => {
                let mut file_name = OsString::from(progress_file.as_os_str());
                file_name.push("-");
                file_name.push(name);
                PathBuf::from(file_name)
            }
        };
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the saved cursor, falling back to [Cursor::ORIGIN]
    /// when there is none or it can't be read.
    pub async fn load(&self) -> Cursor {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!("no checkpoint at {}, starting from the origin", self.path.display());
                return Cursor::ORIGIN
            },
            Err(err) => {
                warn!(err =? err, "failed to read checkpoint {}, starting from the origin", self.path.display());
                return Cursor::ORIGIN
            }
        };
        match text.parse() {
            Ok(cursor) => cursor,
            Err(err) => {
                warn!(err =? err, "checkpoint {} is corrupted, starting from the origin", self.path.display());
                Cursor::ORIGIN
            }
        }
    }

    /// Atomically replaces the saved cursor.
    pub async fn save(&self, cursor: Cursor) -> anyhow::Result<()> {
        let mut tmp = OsString::from(self.path.as_os_str());
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, cursor.to_string()).await.with_context(|| {
            format!("failed to write {}", tmp.display())
        })?;

        tokio::fs::rename(&tmp, &self.path).await.with_context(|| {
            format!("failed to replace checkpoint {}", self.path.display())
        })?;

        Ok(())
    }
}
