use crate::{Cursor, Hash256};
use bytes::Bytes;


pub trait Block: Send + Sync + 'static {
    fn hash(&self) -> Hash256;

    /// Content hashes of the block's transactions, in block order.
    fn tx_hashes(&self) -> &[Hash256];

    /// Canonical wire representation of the whole block.
    fn to_bytes(&self) -> Bytes;
}


/// A block together with the position it was read from.
#[derive(Debug, Clone)]
pub struct StoredBlock<B> {
    pub block: B,
    pub position: Cursor
}
