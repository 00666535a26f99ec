use crate::metrics;
use anyhow::anyhow;
use async_trait::async_trait;
use scopeguard::defer;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::debug;


/// Delivers one work unit to its destination.
///
/// Implementations own their retry loop, a call returns only
/// once the unit is durably written.
#[async_trait]
pub trait UnitWriter: Send + Sync + 'static {
    type Unit: Send + 'static;

    async fn write(&self, unit: Self::Unit);
}


type SharedReceiver<U> = Arc<Mutex<mpsc::Receiver<U>>>;


/// Bounded hand-off queue drained by a fixed set of long-running workers.
///
/// The pool counts every unit from `push` until its write completes,
/// so [WorkerPool::drain] also waits for units already taken by a worker.
pub struct WorkerPool<U> {
    sender: Option<mpsc::Sender<U>>,
    pending: Arc<watch::Sender<usize>>,
    workers: Vec<JoinHandle<()>>
}


impl<U: Send + 'static> WorkerPool<U> {
    pub fn start<W>(writer: Arc<W>, workers: usize, capacity: usize) -> Self
    where
        W: UnitWriter<Unit = U>
    {
        assert!(workers > 0, "worker pool must have at least one worker");
        assert!(capacity > 0, "queue capacity must be positive");

        let (sender, receiver) = mpsc::channel(capacity);
        let receiver = Arc::new(Mutex::new(receiver));
        let pending = Arc::new(watch::Sender::new(0));

        let workers = (0..workers).map(|idx| {
            tokio::spawn(worker_loop(
                idx,
                writer.clone(),
                receiver.clone(),
                pending.clone()
            ))
        }).collect();

        Self {
            sender: Some(sender),
            pending,
            workers
        }
    }

    /// Enqueues a unit, waiting while the queue is full.
    pub async fn push(&self, unit: U) -> anyhow::Result<()> {
        let sender = self.sender.as_ref().ok_or_else(|| anyhow!("worker pool is stopped"))?;
        self.pending.send_modify(|n| *n += 1);
        metrics::UNITS_PENDING.inc();
        if sender.send(unit).await.is_err() {
            self.pending.send_modify(|n| *n -= 1);
            metrics::UNITS_PENDING.dec();
            anyhow::bail!("all workers have exited")
        }
        Ok(())
    }

    /// Number of units queued or being written.
    pub fn pending(&self) -> usize {
        *self.pending.borrow()
    }

    /// Waits until every pushed unit has been written.
    pub async fn drain(&self) {
        let mut pending = self.pending.subscribe();
        // the sender lives in `self`, so the channel can't close under us
        let _ = pending.wait_for(|n| *n == 0).await;
    }

    /// Closes the queue and waits for the workers to finish what is left in it.
    pub async fn shutdown(mut self) -> anyhow::Result<()> {
        self.sender.take();
        for worker in self.workers.drain(..) {
            worker.await?;
        }
        Ok(())
    }
}


async fn worker_loop<W: UnitWriter>(
    idx: usize,
    writer: Arc<W>,
    receiver: SharedReceiver<W::Unit>,
    pending: Arc<watch::Sender<usize>>
) {
    loop {
        let unit = receiver.lock().await.recv().await;
        let Some(unit) = unit else {
            break
        };
        defer! {
            pending.send_modify(|n| *n -= 1);
            metrics::UNITS_PENDING.dec();
        }
        writer.write(unit).await;
    }
    debug!(worker = idx, "worker stopped");
}
