use futures::stream::BoxStream;
use sqd_primitives::{Block, Cursor, StoredBlock};


pub type BlockStream<B> = BoxStream<'static, anyhow::Result<StoredBlock<B>>>;


/// Ordered, resumable sequence of blocks.
///
/// `enumerate(from)` yields every block whose position is `>= from`,
/// strictly ascending by position. The stream ends when the source
/// is exhausted and fails on the first read error.
pub trait BlockSource {
    type Block: Block;

    fn enumerate(&self, from: Cursor) -> BlockStream<Self::Block>;
}
