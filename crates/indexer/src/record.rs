use bytes::Bytes;
use sqd_primitives::Hash256;
use sqd_storage::table::Entity;


pub type PartitionKey = u16;


/// Maps a transaction hash onto one of 2048 partition keys.
///
/// Only the top 3 bits of byte 0 and all of byte 1 are used,
/// so the result depends on nothing but the hash itself.
pub fn partition_key(tx_hash: &Hash256) -> PartitionKey {
    (tx_hash.byte(0) & 0xe0) as PartitionKey + ((tx_hash.byte(1) as PartitionKey) << 8)
}


/// Transaction index entry.
///
/// Row keys are `<txid>-b<block hash>` for confirmed transactions and `<txid>-m`
/// for unconfirmed ones, so a transaction included in two competing blocks
/// gets two distinct rows, while re-indexing the same block overwrites the same row.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct IndexRecord {
    pub partition_key: PartitionKey,
    pub row_key: String
}


impl IndexRecord {
    pub fn confirmed(tx_hash: &Hash256, block_hash: &Hash256) -> Self {
        Self {
            partition_key: partition_key(tx_hash),
            row_key: format!("{}-b{}", tx_hash, block_hash)
        }
    }

    pub fn unconfirmed(tx_hash: &Hash256) -> Self {
        Self {
            partition_key: partition_key(tx_hash),
            row_key: format!("{}-m", tx_hash)
        }
    }

    pub fn to_entity(&self) -> Entity {
        Entity {
            partition_key: self.partition_key.to_string(),
            row_key: self.row_key.clone(),
            value: Bytes::new()
        }
    }
}
