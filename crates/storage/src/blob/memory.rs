use crate::blob::{BlobStore, UploadOutcome};
use anyhow::ensure;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};


#[derive(Default)]
pub struct MemoryBlobStore {
    state: Mutex<State>
}


#[derive(Default)]
struct State {
    containers: BTreeSet<String>,
    objects: BTreeMap<(String, String), Bytes>,
    writes: usize
}


impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, container: &str, key: &str) -> Option<Bytes> {
        self.state.lock().objects.get(&(container.to_string(), key.to_string())).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of writes that actually stored data.
    pub fn writes(&self) -> usize {
        self.state.lock().writes
    }
}


#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn create_container_if_missing(&self, container: &str) -> anyhow::Result<()> {
        self.state.lock().containers.insert(container.to_string());
        Ok(())
    }

    async fn upload_if_absent(&self, container: &str, key: &str, data: Bytes) -> anyhow::Result<UploadOutcome> {
        let mut state = self.state.lock();
        ensure!(state.containers.contains(container), "container '{}' does not exist", container);
        let id = (container.to_string(), key.to_string());
        if state.objects.contains_key(&id) {
            return Ok(UploadOutcome::AlreadyExists)
        }
        state.objects.insert(id, data);
        state.writes += 1;
        Ok(UploadOutcome::Uploaded)
    }

    async fn upload(&self, container: &str, key: &str, data: Bytes) -> anyhow::Result<()> {
        let mut state = self.state.lock();
        ensure!(state.containers.contains(container), "container '{}' does not exist", container);
        state.objects.insert((container.to_string(), key.to_string()), data);
        state.writes += 1;
        Ok(())
    }
}
