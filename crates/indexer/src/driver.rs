use crate::batcher::{Batch, Batcher};
use crate::checkpoint::CheckpointStore;
use crate::metrics;
use crate::progress::Progress;
use crate::queue::{UnitWriter, WorkerPool};
use crate::record::IndexRecord;
use futures::TryStreamExt;
use sqd_block_store::BlockSource;
use sqd_primitives::{Block, Cursor, StoredBlock};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};


const REPORT_INTERVAL: Duration = Duration::from_secs(5);


/// Turns blocks into work units.
///
/// Only the driver's producer loop ever touches a pipeline.
pub trait Pipeline {
    const NAME: &'static str;

    type Block: Block;
    type Unit: Send + 'static;

    fn on_block(&mut self, block: StoredBlock<Self::Block>, units: &mut Vec<Self::Unit>);

    /// Emits everything still held back by the pipeline.
    fn flush(&mut self, units: &mut Vec<Self::Unit>);
}


/// Transaction index pipeline, one [IndexRecord] per transaction,
/// grouped into same-partition batches.
pub struct TxPipeline<B> {
    batcher: Batcher,
    phantom_data: PhantomData<fn() -> B>
}


impl<B> Default for TxPipeline<B> {
    fn default() -> Self {
        Self::new(Batcher::default())
    }
}


impl<B> TxPipeline<B> {
    pub fn new(batcher: Batcher) -> Self {
        Self {
            batcher,
            phantom_data: PhantomData
        }
    }
}


impl<B: Block> Pipeline for TxPipeline<B> {
    const NAME: &'static str = "transactions";

    type Block = B;
    type Unit = Batch;

    fn on_block(&mut self, block: StoredBlock<B>, units: &mut Vec<Batch>) {
        let block_hash = block.block.hash();
        for tx_hash in block.block.tx_hashes() {
            metrics::TX_RECORDS_QUEUED.inc();
            units.extend(
                self.batcher.add(IndexRecord::confirmed(tx_hash, &block_hash))
            );
        }
    }

    fn flush(&mut self, units: &mut Vec<Batch>) {
        units.extend(self.batcher.flush_all())
    }
}


/// Raw block pipeline, every block is a unit of its own.
pub struct BlockPipeline<B> {
    phantom_data: PhantomData<fn() -> B>
}


impl<B> Default for BlockPipeline<B> {
    fn default() -> Self {
        Self {
            phantom_data: PhantomData
        }
    }
}


impl<B: Block> Pipeline for BlockPipeline<B> {
    const NAME: &'static str = "blocks";

    type Block = B;
    type Unit = StoredBlock<B>;

    fn on_block(&mut self, block: StoredBlock<B>, units: &mut Vec<StoredBlock<B>>) {
        units.push(block)
    }

    fn flush(&mut self, _units: &mut Vec<StoredBlock<B>>) {}
}


#[derive(Debug, Clone)]
pub struct DriverOptions {
    pub workers: usize,
    pub queue_capacity: usize,
    pub checkpoint_interval: Duration
}


impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            workers: 8,
            queue_capacity: 20,
            checkpoint_interval: Duration::from_secs(300)
        }
    }
}


#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RunSummary {
    /// Cursor the run resumed from
    pub start: Cursor,
    /// Position of the last block read
    pub cursor: Cursor,
    pub blocks: u64,
    pub units: u64,
    /// Number of checkpoint writes
    pub checkpoints: usize
}


pub struct Driver<P, W> {
    pipeline: P,
    writer: Arc<W>,
    checkpoints: CheckpointStore,
    options: DriverOptions,
    shutdown: CancellationToken
}


impl<P, W> Driver<P, W>
where
    P: Pipeline,
    W: UnitWriter<Unit = P::Unit>
{
    pub fn new(
        pipeline: P,
        writer: Arc<W>,
        checkpoints: CheckpointStore,
        options: DriverOptions
    ) -> Self {
        Self {
            pipeline,
            writer,
            checkpoints,
            options,
            shutdown: CancellationToken::new()
        }
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Pumps blocks from `source` into the writer until the source is exhausted
    /// or shutdown is requested.
    ///
    /// The cursor is persisted only after every unit produced so far has been written.
    /// A source error aborts the run, leaving the last persisted cursor in place.
    pub async fn run<S>(mut self, source: &S) -> anyhow::Result<RunSummary>
    where
        S: BlockSource<Block = P::Block>
    {
        let start = self.checkpoints.load().await;
        info!(stream = P::NAME, "starting import at {}", start);

        let mut summary = RunSummary {
            start,
            cursor: start,
            blocks: 0,
            units: 0,
            checkpoints: 0
        };
        let mut saved = start;

        let pool = WorkerPool::start(
            self.writer.clone(),
            self.options.workers,
            self.options.queue_capacity
        );

        let mut stream = source.enumerate(start);
        let mut units = Vec::new();
        let mut progress = Progress::new(10, Duration::from_secs(1));
        let mut last_checkpoint = Instant::now();
        let mut last_report = Instant::now();

        loop {
            let next = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    info!(stream = P::NAME, "shutdown requested");
                    break
                },
                next = stream.try_next() => next?
            };

            let Some(block) = next else {
                break
            };

            summary.cursor = block.position;
            summary.blocks += 1;
            metrics::BLOCKS_READ.inc();

            self.pipeline.on_block(block, &mut units);
            summary.units += submit(&pool, &mut units).await?;

            progress.set_current_value(summary.blocks);
            if last_report.elapsed() >= REPORT_INTERVAL {
                report(&mut progress, summary.cursor);
                last_report = Instant::now();
            }

            if last_checkpoint.elapsed() >= self.options.checkpoint_interval {
                self.pipeline.flush(&mut units);
                summary.units += submit(&pool, &mut units).await?;
                pool.drain().await;
                if summary.cursor != saved {
                    self.save(summary.cursor).await?;
                    saved = summary.cursor;
                    summary.checkpoints += 1;
                }
                last_checkpoint = Instant::now();
            }
        }

        self.pipeline.flush(&mut units);
        summary.units += submit(&pool, &mut units).await?;
        pool.drain().await;
        pool.shutdown().await?;

        if summary.cursor != saved {
            self.save(summary.cursor).await?;
            summary.checkpoints += 1;
        } else {
            debug!(stream = P::NAME, "cursor {} is already saved", saved);
        }

        if progress.has_news() {
            report(&mut progress, summary.cursor);
        }

        info!(
            stream = P::NAME,
            blocks = summary.blocks,
            units = summary.units,
            "import stopped at {}",
            summary.cursor
        );

        Ok(summary)
    }

    async fn save(&self, cursor: Cursor) -> anyhow::Result<()> {
        self.checkpoints.save(cursor).await?;
        metrics::LAST_SAVED_FILE.set(cursor.file as i64);
        metrics::LAST_SAVED_OFFSET.set(cursor.offset as i64);
        info!("checkpoint saved at {}", cursor);
        Ok(())
    }
}


async fn submit<U: Send + 'static>(pool: &WorkerPool<U>, units: &mut Vec<U>) -> anyhow::Result<u64> {
    let mut submitted = 0;
    for unit in units.drain(..) {
        pool.push(unit).await?;
        submitted += 1;
    }
    Ok(submitted)
}


fn report(progress: &mut Progress, cursor: Cursor) {
    let speed = progress.speed();
    metrics::PROGRESS.set(speed);
    info!(
        "last block: {}, progress: {} blocks/sec",
        cursor,
        speed.round()
    );
}
