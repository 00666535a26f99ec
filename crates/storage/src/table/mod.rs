use async_trait::async_trait;
use bytes::Bytes;
use std::fmt::{Display, Formatter};
use std::sync::Arc;


mod memory;
mod rocks;


pub use memory::MemoryTableStore;
pub use rocks::RocksTableStore;


/// Maximum number of entities a single atomic batch may carry.
pub const MAX_BATCH_SIZE: usize = 100;


pub type TableStoreRef = Arc<dyn TableStore + Send + Sync>;


#[derive(Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Entity {
    pub partition_key: String,
    pub row_key: String,
    pub value: Bytes
}


/// Partitioned key-value table store.
///
/// Entities are addressed by `(partition_key, row_key)`.
#[async_trait]
pub trait TableStore {
    async fn create_table_if_missing(&self, table: &str) -> anyhow::Result<()>;

    /// Atomically inserts or replaces all entities of the batch.
    ///
    /// The batch must be non-empty, carry at most [MAX_BATCH_SIZE] entities and
    /// all of them must share one partition key. Otherwise the whole call fails
    /// with [InvalidBatch] and nothing is written.
    async fn insert_or_replace(&self, table: &str, batch: &[Entity]) -> anyhow::Result<()>;
}


#[derive(Debug, Clone, Eq, PartialEq)]
pub enum InvalidBatch {
    Empty,
    TooLarge(usize),
    MixedPartitions {
        first: String,
        other: String
    }
}


impl Display for InvalidBatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidBatch::Empty => write!(f, "batch is empty"),
            InvalidBatch::TooLarge(size) => write!(
                f,
                "batch has {} entities, while at most {} are allowed",
                size,
                MAX_BATCH_SIZE
            ),
            InvalidBatch::MixedPartitions { first, other } => write!(
                f,
                "all entities of a batch must share one partition key, but got both '{}' and '{}'",
                first,
                other
            )
        }
    }
}


impl std::error::Error for InvalidBatch {}


pub fn validate_batch(batch: &[Entity]) -> Result<(), InvalidBatch> {
    let first = batch.first().ok_or(InvalidBatch::Empty)?;
    if batch.len() > MAX_BATCH_SIZE {
        return Err(InvalidBatch::TooLarge(batch.len()))
    }
    if let Some(other) = batch.iter().find(|e| e.partition_key != first.partition_key) {
        return Err(InvalidBatch::MixedPartitions {
            first: first.partition_key.clone(),
            other: other.partition_key.clone()
        })
    }
    Ok(())
}
