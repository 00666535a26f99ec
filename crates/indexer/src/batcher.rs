use crate::record::{IndexRecord, PartitionKey};
use sqd_storage::table::MAX_BATCH_SIZE;
use std::collections::HashMap;


/// Records sharing one partition key, written as one atomic batch.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Batch {
    pub partition_key: PartitionKey,
    pub records: Vec<IndexRecord>
}


impl Batch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}


/// Groups index records by partition key.
///
/// Owned by the producer task alone, it is never shared between tasks.
pub struct Batcher {
    buckets: HashMap<PartitionKey, Vec<IndexRecord>>,
    max_batch_size: usize,
    pending: usize
}


impl Default for Batcher {
    fn default() -> Self {
        Self::new(MAX_BATCH_SIZE)
    }
}


impl Batcher {
    pub fn new(max_batch_size: usize) -> Self {
        assert!(max_batch_size > 0 && max_batch_size <= MAX_BATCH_SIZE);
        Self {
            buckets: HashMap::new(),
            max_batch_size,
            pending: 0
        }
    }

    /// Adds a record, returning its bucket as a batch once the bucket is full.
    pub fn add(&mut self, record: IndexRecord) -> Option<Batch> {
        let key = record.partition_key;
        let bucket = self.buckets.entry(key).or_default();
        bucket.push(record);
        self.pending += 1;
        if bucket.len() >= self.max_batch_size {
            self.flush(key)
        } else {
            None
        }
    }

    pub fn flush(&mut self, key: PartitionKey) -> Option<Batch> {
        let records = self.buckets.remove(&key)?;
        self.pending -= records.len();
        Some(Batch {
            partition_key: key,
            records
        })
    }

    /// Empties all buckets, in no particular order.
    pub fn flush_all(&mut self) -> impl Iterator<Item = Batch> + '_ {
        self.pending = 0;
        self.buckets.drain().map(|(partition_key, records)| Batch {
            partition_key,
            records
        })
    }

    /// Number of records waiting in buckets.
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn bucket_len(&self, key: PartitionKey) -> usize {
        self.buckets.get(&key).map_or(0, |b| b.len())
    }
}
