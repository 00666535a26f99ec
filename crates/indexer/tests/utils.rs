#![allow(dead_code)]
use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, StreamExt};
use parking_lot::Mutex;
use sqd_block_store::{BlockSource, BlockStream, MemoryBlockSource};
use sqd_indexer::driver::DriverOptions;
use sqd_primitives::{Block, Cursor, Hash256, StoredBlock};
use sqd_storage::blob::{BlobStore, MemoryBlobStore, UploadOutcome};
use sqd_storage::table::{Entity, MemoryTableStore, TableStore};
use std::time::Duration;


#[derive(Debug, Clone)]
pub struct TestBlock {
    pub hash: Hash256,
    pub txs: Vec<Hash256>,
    pub bytes: Bytes
}


impl Block for TestBlock {
    fn hash(&self) -> Hash256 {
        self.hash
    }

    fn tx_hashes(&self) -> &[Hash256] {
        &self.txs
    }

    fn to_bytes(&self) -> Bytes {
        self.bytes.clone()
    }
}


/// Hash with the given two leading bytes, the rest is filled with `seed`.
pub fn hash(b0: u8, b1: u8, seed: u8) -> Hash256 {
    let mut bytes = [seed; 32];
    bytes[0] = b0;
    bytes[1] = b1;
    Hash256::from_bytes(bytes)
}


/// Hash with the given two leading bytes followed by `n` in little endian.
pub fn numbered_hash(b0: u8, b1: u8, n: u32) -> Hash256 {
    let mut bytes = [0; 32];
    bytes[0] = b0;
    bytes[1] = b1;
    bytes[2..6].copy_from_slice(&n.to_le_bytes());
    Hash256::from_bytes(bytes)
}


pub fn test_block(seed: u8, txs: Vec<Hash256>, size: usize) -> TestBlock {
    TestBlock {
        hash: hash(0xbb, seed, seed),
        txs,
        bytes: Bytes::from(vec![seed; size])
    }
}


/// Places blocks one kilobyte apart in a single file.
pub fn memory_source(blocks: Vec<TestBlock>) -> MemoryBlockSource<TestBlock> {
    let blocks = blocks.into_iter().enumerate().map(|(i, block)| StoredBlock {
        block,
        position: Cursor::new(0, i as u64 * 1024)
    }).collect();
    MemoryBlockSource::new(blocks).unwrap()
}


pub fn options() -> DriverOptions {
    DriverOptions {
        workers: 4,
        queue_capacity: 20,
        checkpoint_interval: Duration::from_secs(300)
    }
}


/// Yields `limit` blocks of the inner source and then fails.
pub struct FailingSource<S> {
    pub inner: S,
    pub limit: usize
}


impl<S: BlockSource> BlockSource for FailingSource<S> {
    type Block = S::Block;

    fn enumerate(&self, from: Cursor) -> BlockStream<S::Block> {
        let failure = stream::once(async { Err(anyhow::anyhow!("block file is unreadable")) });
        self.inner.enumerate(from).take(self.limit).chain(failure).boxed()
    }
}


/// Yields the inner source's blocks and then waits forever.
pub struct EndlessSource<S> {
    pub inner: S
}


impl<S: BlockSource> BlockSource for EndlessSource<S> {
    type Block = S::Block;

    fn enumerate(&self, from: Cursor) -> BlockStream<S::Block> {
        self.inner.enumerate(from).chain(stream::pending()).boxed()
    }
}


/// Table store that fails the first `failures` writes and records batch sizes.
pub struct FlakyTable {
    pub inner: MemoryTableStore,
    failures: Mutex<usize>,
    attempts: Mutex<Vec<usize>>
}


impl FlakyTable {
    pub fn new(failures: usize) -> Self {
        Self {
            inner: MemoryTableStore::new(),
            failures: Mutex::new(failures),
            attempts: Mutex::new(Vec::new())
        }
    }

    /// Sizes of all attempted batches, failed ones included.
    pub fn attempts(&self) -> Vec<usize> {
        self.attempts.lock().clone()
    }

    pub fn rows(&self, table: &str) -> Vec<Entity> {
        self.inner.rows(table)
    }
}


#[async_trait]
impl TableStore for FlakyTable {
    async fn create_table_if_missing(&self, table: &str) -> anyhow::Result<()> {
        self.inner.create_table_if_missing(table).await
    }

    async fn insert_or_replace(&self, table: &str, batch: &[Entity]) -> anyhow::Result<()> {
        self.attempts.lock().push(batch.len());
        {
            let mut failures = self.failures.lock();
            if *failures > 0 {
                *failures -= 1;
                anyhow::bail!("service unavailable")
            }
        }
        self.inner.insert_or_replace(table, batch).await
    }
}


#[derive(Debug, Clone, Eq, PartialEq)]
pub enum BlobCall {
    IfAbsent(String),
    Overwrite(String)
}


/// Blob store that fails the first `failures` uploads and records every call.
pub struct FlakyBlobs {
    pub inner: MemoryBlobStore,
    failures: Mutex<usize>,
    calls: Mutex<Vec<BlobCall>>
}


impl FlakyBlobs {
    pub fn new(failures: usize) -> Self {
        Self {
            inner: MemoryBlobStore::new(),
            failures: Mutex::new(failures),
            calls: Mutex::new(Vec::new())
        }
    }

    pub fn calls(&self) -> Vec<BlobCall> {
        self.calls.lock().clone()
    }

    fn fail(&self) -> anyhow::Result<()> {
        let mut failures = self.failures.lock();
        if *failures > 0 {
            *failures -= 1;
            anyhow::bail!("connection reset")
        }
        Ok(())
    }
}


#[async_trait]
impl BlobStore for FlakyBlobs {
    async fn create_container_if_missing(&self, container: &str) -> anyhow::Result<()> {
        self.inner.create_container_if_missing(container).await
    }

    async fn upload_if_absent(&self, container: &str, key: &str, data: Bytes) -> anyhow::Result<UploadOutcome> {
        self.calls.lock().push(BlobCall::IfAbsent(key.to_string()));
        self.fail()?;
        self.inner.upload_if_absent(container, key, data).await
    }

    async fn upload(&self, container: &str, key: &str, data: Bytes) -> anyhow::Result<()> {
        self.calls.lock().push(BlobCall::Overwrite(key.to_string()));
        self.fail()?;
        self.inner.upload(container, key, data).await
    }
}
