use crate::table::{validate_batch, Entity, TableStore};
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use bytes::Bytes;
use rocksdb::{IteratorMode, Options as RocksOptions, WriteBatch};
use std::path::Path;
use std::sync::Arc;


type RocksDB = rocksdb::DBWithThreadMode<rocksdb::MultiThreaded>;


const KEY_SEPARATOR: u8 = 0;


/// Table store on top of a local rocksdb database.
///
/// Every table is a column family, keys are `<partition_key> 0x00 <row_key>`.
/// One batch is one rocksdb `WriteBatch`, so it is applied atomically.
#[derive(Clone)]
pub struct RocksTableStore {
    db: Arc<RocksDB>
}


impl RocksTableStore {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();

        let mut options = RocksOptions::default();
        options.create_if_missing(true);
        options.create_missing_column_families(true);
        options.set_wal_compression_type(rocksdb::DBCompressionType::Zstd);

        let column_families = if path.exists() {
            RocksDB::list_cf(&options, path).unwrap_or_else(|_| vec![])
        } else {
            vec![]
        };

        let db = RocksDB::open_cf(&options, path, column_families).with_context(|| {
            format!("failed to open rocksdb database at {}", path.display())
        })?;

        Ok(Self {
            db: Arc::new(db)
        })
    }

    /// All entities of the table ordered by `(partition_key, row_key)`.
    pub fn rows(&self, table: &str) -> anyhow::Result<Vec<Entity>> {
        let cf = self.db.cf_handle(table).ok_or_else(|| {
            anyhow!("table '{}' does not exist", table)
        })?;

        let mut rows = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (key, value) = item?;
            rows.push(decode_entity(&key, &value)?);
        }
        Ok(rows)
    }

    fn write_batch(&self, table: &str, batch: &[Entity]) -> anyhow::Result<()> {
        validate_batch(batch)?;

        let cf = self.db.cf_handle(table).ok_or_else(|| {
            anyhow!("table '{}' does not exist", table)
        })?;

        let mut write_batch = WriteBatch::default();
        for entity in batch {
            write_batch.put_cf(&cf, encode_key(entity), &entity.value);
        }
        self.db.write(write_batch)?;
        Ok(())
    }
}


#[async_trait]
impl TableStore for RocksTableStore {
    async fn create_table_if_missing(&self, table: &str) -> anyhow::Result<()> {
        let db = self.db.clone();
        let table = table.to_string();
        tokio::task::spawn_blocking(move || {
            if db.cf_handle(&table).is_none() {
                db.create_cf(&table, &RocksOptions::default())?;
            }
            Ok::<_, anyhow::Error>(())
        }).await?
    }

    async fn insert_or_replace(&self, table: &str, batch: &[Entity]) -> anyhow::Result<()> {
        let this = self.clone();
        let table = table.to_string();
        let batch = batch.to_vec();
        tokio::task::spawn_blocking(move || this.write_batch(&table, &batch)).await?
    }
}


fn encode_key(entity: &Entity) -> Vec<u8> {
    let mut key = Vec::with_capacity(entity.partition_key.len() + 1 + entity.row_key.len());
    key.extend_from_slice(entity.partition_key.as_bytes());
    key.push(KEY_SEPARATOR);
    key.extend_from_slice(entity.row_key.as_bytes());
    key
}


fn decode_entity(key: &[u8], value: &[u8]) -> anyhow::Result<Entity> {
    let sep = key.iter().position(|b| *b == KEY_SEPARATOR).context("malformed entity key")?;
    Ok(Entity {
        partition_key: std::str::from_utf8(&key[..sep])?.to_string(),
        row_key: std::str::from_utf8(&key[sep + 1..])?.to_string(),
        value: Bytes::copy_from_slice(value)
    })
}
