use crate::batcher::Batch;
use crate::metrics;
use crate::queue::UnitWriter;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use sqd_primitives::{Block, StoredBlock};
use sqd_storage::blob::{BlobStoreRef, UploadOutcome};
use sqd_storage::table::{Entity, TableStoreRef};
use std::marker::PhantomData;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error};


pub const SECTOR_SIZE: usize = 512;


/// Fixed delay retry without an attempt limit.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct RetryPolicy {
    pub backoff: Duration
}


impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            backoff: Duration::from_secs(5)
        }
    }
}


impl RetryPolicy {
    async fn pause(&self) {
        tokio::time::sleep(self.backoff).await
    }
}


/// Writes transaction batches as atomic insert-or-replace calls.
pub struct TxBatchWriter {
    table: TableStoreRef,
    table_name: String,
    retry: RetryPolicy
}


impl TxBatchWriter {
    pub fn new(table: TableStoreRef, table_name: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            table,
            table_name: table_name.into(),
            retry
        }
    }
}


#[async_trait]
impl UnitWriter for TxBatchWriter {
    type Unit = Batch;

    async fn write(&self, batch: Batch) {
        let entities: Vec<Entity> = batch.records.iter().map(|r| r.to_entity()).collect();
        let started = Instant::now();
        let mut attempt = 1;

        while let Err(err) = self.table.insert_or_replace(&self.table_name, &entities).await {
            metrics::TX_WRITE_ERRORS.inc();
            error!(
                err =? err,
                partition_key = batch.partition_key,
                records = entities.len(),
                attempt,
                "failed to write transaction batch, will retry in {:?}",
                self.retry.backoff
            );
            self.retry.pause().await;
            attempt += 1;
        }

        metrics::TX_BATCHES_WRITTEN.inc();
        metrics::TX_RECORDS_WRITTEN.inc_by(entities.len() as u64);
        debug!(
            partition_key = batch.partition_key,
            records = entities.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "transaction batch written"
        );
    }
}


/// Uploads raw blocks keyed by block hash.
///
/// The first attempt is write-once. Once an attempt has failed the object may
/// exist in a partial state, so further attempts overwrite unconditionally.
pub struct BlockUploader<B> {
    blobs: BlobStoreRef,
    container: String,
    retry: RetryPolicy,
    phantom_data: PhantomData<fn() -> B>
}


impl<B> BlockUploader<B> {
    pub fn new(blobs: BlobStoreRef, container: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            blobs,
            container: container.into(),
            retry,
            phantom_data: PhantomData
        }
    }

    async fn attempt(&self, key: &str, data: Bytes, conditional: bool) -> anyhow::Result<UploadOutcome> {
        if conditional {
            self.blobs.upload_if_absent(&self.container, key, data).await
        } else {
            self.blobs.upload(&self.container, key, data).await?;
            Ok(UploadOutcome::Uploaded)
        }
    }
}


#[async_trait]
impl<B: Block> UnitWriter for BlockUploader<B> {
    type Unit = StoredBlock<B>;

    async fn write(&self, unit: StoredBlock<B>) {
        let key = unit.block.hash().to_string();
        let data = pad_to_sector(unit.block.to_bytes());
        let started = Instant::now();
        let mut attempt = 1;

        let outcome = loop {
            match self.attempt(&key, data.clone(), attempt == 1).await {
                Ok(outcome) => break outcome,
                Err(err) => {
                    metrics::BLOCK_UPLOAD_ERRORS.inc();
                    error!(
                        err =? err,
                        block = %key,
                        position = %unit.position,
                        attempt,
                        "failed to upload block, will retry in {:?}",
                        self.retry.backoff
                    );
                    self.retry.pause().await;
                    attempt += 1;
                }
            }
        };

        match outcome {
            UploadOutcome::Uploaded => {
                metrics::BLOCKS_UPLOADED.inc();
                metrics::BLOCK_BYTES_UPLOADED.inc_by(data.len() as u64);
                debug!(
                    block = %key,
                    bytes = data.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "block uploaded"
                );
            },
            UploadOutcome::AlreadyExists => {
                metrics::BLOCKS_ALREADY_UPLOADED.inc();
                debug!(block = %key, "block already uploaded");
            }
        }
    }
}


/// Zero-pads `data` up to the next multiple of [SECTOR_SIZE].
pub fn pad_to_sector(data: Bytes) -> Bytes {
    let rem = data.len() % SECTOR_SIZE;
    if rem == 0 {
        return data
    }
    let mut buf = BytesMut::with_capacity(data.len() + SECTOR_SIZE - rem);
    buf.extend_from_slice(&data);
    buf.resize(data.len() + SECTOR_SIZE - rem, 0);
    buf.freeze()
}


#[cfg(test)]
mod test {
    use super::*;


    #[test]
    fn padding() {
        assert_eq!(pad_to_sector(Bytes::new()).len(), 0);
        assert_eq!(pad_to_sector(Bytes::from(vec![1; 512])).len(), 512);

        let padded = pad_to_sector(Bytes::from(vec![7; 513]));
        assert_eq!(padded.len(), 1024);
        assert!(padded[..513].iter().all(|b| *b == 7));
        assert!(padded[513..].iter().all(|b| *b == 0));

        assert_eq!(pad_to_sector(Bytes::from_static(b"abc")).len(), 512);
    }
}
