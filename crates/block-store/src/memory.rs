use crate::types::{BlockSource, BlockStream};
use anyhow::ensure;
use futures::stream;
use sqd_primitives::{Block, Cursor, StoredBlock};


/// Block source over an in-memory list of blocks.
#[derive(Debug, Clone)]
pub struct MemoryBlockSource<B> {
    blocks: Vec<StoredBlock<B>>
}


impl<B: Block + Clone> MemoryBlockSource<B> {
    pub fn new(blocks: Vec<StoredBlock<B>>) -> anyhow::Result<Self> {
        ensure!(
            blocks.windows(2).all(|w| w[0].position < w[1].position),
            "blocks must be strictly ordered by position"
        );
        Ok(Self { blocks })
    }

    pub fn blocks(&self) -> &[StoredBlock<B>] {
        &self.blocks
    }
}


impl<B: Block + Clone> BlockSource for MemoryBlockSource<B> {
    type Block = B;

    fn enumerate(&self, from: Cursor) -> BlockStream<B> {
        let start = self.blocks.partition_point(|b| b.position < from);
        let blocks: Vec<_> = self.blocks[start..].iter().cloned().map(Ok).collect();
        Box::pin(stream::iter(blocks))
    }
}
