use crate::checkpoint::{CheckpointStore, CheckpointStream};
use crate::config::ImporterConfig;
use crate::driver::{BlockPipeline, Driver, RunSummary, TxPipeline};
use crate::writer::{BlockUploader, TxBatchWriter};
use anyhow::{anyhow, Context};
use sqd_block_store::{BitcoinBlock, DiskBlockStore};
use sqd_storage::blob::{create_blob_store, BlobStoreRef};
use sqd_storage::table::{RocksTableStore, TableStoreRef};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;


fn block_store(config: &ImporterConfig) -> DiskBlockStore {
    DiskBlockStore::new(&config.block_dir, config.network.into())
}


pub async fn run_transactions(
    config: &ImporterConfig,
    shutdown: CancellationToken
) -> anyhow::Result<RunSummary> {
    let table_db = config.table_db.as_ref().ok_or_else(|| {
        anyhow!("table_db must be configured for transaction import")
    })?;

    let table: TableStoreRef = RocksTableStore::open(table_db)
        .map(Arc::new)
        .with_context(|| format!("failed to open table database at {}", table_db.display()))?;

    import_transactions(config, table, shutdown).await
}


/// Transaction import against an already opened table store.
pub async fn import_transactions(
    config: &ImporterConfig,
    table: TableStoreRef,
    shutdown: CancellationToken
) -> anyhow::Result<RunSummary> {
    table.create_table_if_missing(&config.table).await.with_context(|| {
        format!("failed to create table '{}'", config.table)
    })?;

    let writer = TxBatchWriter::new(table, config.table.clone(), config.retry_policy());

    Driver::new(
        TxPipeline::<BitcoinBlock>::default(),
        Arc::new(writer),
        CheckpointStore::new(&config.progress_file, CheckpointStream::Transactions),
        config.driver_options()
    )
    .with_shutdown(shutdown)
    .run(&block_store(config))
    .await
}


pub async fn run_blocks(
    config: &ImporterConfig,
    shutdown: CancellationToken
) -> anyhow::Result<RunSummary> {
    let dest = config.blob_dest.as_ref().ok_or_else(|| {
        anyhow!("blob_dest must be configured for block import")
    })?;

    let blobs = create_blob_store(dest, &config.transport()).await?;

    import_blocks(config, blobs, shutdown).await
}


/// Block import against an already created blob store.
pub async fn import_blocks(
    config: &ImporterConfig,
    blobs: BlobStoreRef,
    shutdown: CancellationToken
) -> anyhow::Result<RunSummary> {
    blobs.create_container_if_missing(&config.container).await.with_context(|| {
        format!("failed to create container '{}'", config.container)
    })?;

    let uploader = BlockUploader::<BitcoinBlock>::new(
        blobs,
        config.container.clone(),
        config.retry_policy()
    );

    Driver::new(
        BlockPipeline::<BitcoinBlock>::default(),
        Arc::new(uploader),
        CheckpointStore::new(&config.progress_file, CheckpointStream::Blocks),
        config.driver_options()
    )
    .with_shutdown(shutdown)
    .run(&block_store(config))
    .await
}
