use crate::table::{validate_batch, Entity, TableStore};
use anyhow::anyhow;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::BTreeMap;


type Table = BTreeMap<(String, String), Bytes>;


#[derive(Default)]
pub struct MemoryTableStore {
    tables: Mutex<BTreeMap<String, Table>>
}


impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.tables.lock().contains_key(table)
    }

    /// All entities of the table ordered by `(partition_key, row_key)`.
    pub fn rows(&self, table: &str) -> Vec<Entity> {
        self.tables.lock().get(table).map_or_else(Vec::new, |rows| {
            rows.iter().map(|((partition_key, row_key), value)| Entity {
                partition_key: partition_key.clone(),
                row_key: row_key.clone(),
                value: value.clone()
            }).collect()
        })
    }
}


#[async_trait]
impl TableStore for MemoryTableStore {
    async fn create_table_if_missing(&self, table: &str) -> anyhow::Result<()> {
        self.tables.lock().entry(table.to_string()).or_default();
        Ok(())
    }

    async fn insert_or_replace(&self, table: &str, batch: &[Entity]) -> anyhow::Result<()> {
        validate_batch(batch)?;
        let mut tables = self.tables.lock();
        let rows = tables.get_mut(table).ok_or_else(|| {
            anyhow!("table '{}' does not exist", table)
        })?;
        for entity in batch {
            rows.insert(
                (entity.partition_key.clone(), entity.row_key.clone()),
                entity.value.clone()
            );
        }
        Ok(())
    }
}
