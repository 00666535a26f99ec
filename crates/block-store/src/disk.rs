use crate::bitcoin::{BitcoinBlock, Network};
use crate::types::{BlockSource, BlockStream};
use anyhow::{bail, Context};
use async_stream::try_stream;
use bytes::Bytes;
use sqd_primitives::{Cursor, StoredBlock};
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, BufReader};
use tracing::{debug, warn};


const FRAME_HEADER_SIZE: u64 = 8;


/// Reads blocks from a directory of `blkNNNNN.dat` files.
///
/// Every record is framed as `<magic:4><size:u32 le><block:size>`.
/// A cursor points at the first byte of a record's magic.
pub struct DiskBlockStore {
    dir: PathBuf,
    magic: [u8; 4]
}


impl DiskBlockStore {
    pub fn new(dir: impl Into<PathBuf>, network: Network) -> Self {
        Self {
            dir: dir.into(),
            magic: network.magic()
        }
    }

    pub fn file_path(&self, file: u32) -> PathBuf {
        block_file_path(&self.dir, file)
    }
}


impl BlockSource for DiskBlockStore {
    type Block = BitcoinBlock;

    fn enumerate(&self, from: Cursor) -> BlockStream<BitcoinBlock> {
        let dir = self.dir.clone();
        let magic = self.magic;

        Box::pin(try_stream! {
            let mut position = from;

            loop {
                let path = block_file_path(&dir, position.file);

                let Some(mut file) = open_block_file(&path).await? else {
                    debug!("{} does not exist, block source is exhausted", path.display());
                    break
                };

                if position.offset > 0 {
                    file.seek(SeekFrom::Start(position.offset)).await.with_context(|| {
                        format!("failed to seek to {}", position)
                    })?;
                }

                let mut reader = BufReader::new(file);

                while let Some(raw) = read_frame(&mut reader, &magic, position).await? {
                    let len = raw.len() as u64;
                    let block = BitcoinBlock::parse(raw).with_context(|| {
                        format!("failed to parse block at {}", position)
                    })?;
                    yield StoredBlock {
                        block,
                        position
                    };
                    position.offset += FRAME_HEADER_SIZE + len;
                }

                position = Cursor::new(position.file + 1, 0);
            }
        })
    }
}


fn block_file_path(dir: &Path, file: u32) -> PathBuf {
    dir.join(format!("blk{:05}.dat", file))
}


async fn open_block_file(path: &Path) -> anyhow::Result<Option<tokio::fs::File>> {
    match tokio::fs::File::open(path).await {
        Ok(file) => Ok(Some(file)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err).with_context(|| format!("failed to open {}", path.display()))
    }
}


/// Returns `None` when the file has no more complete records.
async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
    magic: &[u8; 4],
    position: Cursor
) -> anyhow::Result<Option<Bytes>>
{
    let mut header = [0u8; FRAME_HEADER_SIZE as usize];
    let header_len = read_full(reader, &mut header).await?;
    if header_len == 0 {
        return Ok(None)
    }
    if header_len < header.len() {
        warn!("incomplete record header at {}, treating it as the end of file", position);
        return Ok(None)
    }

    // bitcoin core preallocates block files with zeros
    if header[0..4] == [0; 4] {
        return Ok(None)
    }

    if header[0..4] != magic[..] {
        bail!(
            "unexpected magic bytes {:02x?} at {}, wrong network or damaged block file",
            &header[0..4],
            position
        );
    }

    let size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;
    let mut data = vec![0; size];
    let data_len = read_full(reader, &mut data).await?;
    if data_len < size {
        warn!(
            "block record at {} is truncated ({} of {} bytes), treating it as the end of file",
            position,
            data_len,
            size
        );
        return Ok(None)
    }

    Ok(Some(Bytes::from(data)))
}


async fn read_full<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break
        }
        filled += n;
    }
    Ok(filled)
}
