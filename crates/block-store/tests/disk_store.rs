use futures::TryStreamExt;
use sqd_block_store::{sha256d, BitcoinBlock, BlockSource, DiskBlockStore, Network};
use sqd_primitives::{Block, Cursor, Hash256};
use std::path::Path;


fn legacy_tx(seed: u8) -> Vec<u8> {
    let mut tx = vec![1, 0, 0, 0];
    tx.push(1);
    tx.extend_from_slice(&[seed; 32]);
    tx.extend_from_slice(&[0, 0, 0, 0]);
    tx.push(0);
    tx.extend_from_slice(&[0xff; 4]);
    tx.push(1);
    tx.extend_from_slice(&[seed, 0, 0, 0, 0, 0, 0, 0]);
    tx.push(1);
    tx.push(0x51);
    tx.extend_from_slice(&[0, 0, 0, 0]);
    tx
}


fn segwit_tx(seed: u8) -> Vec<u8> {
    let legacy = legacy_tx(seed);
    let mut tx = legacy[0..4].to_vec();
    tx.extend_from_slice(&[0x00, 0x01]);
    tx.extend_from_slice(&legacy[4..legacy.len() - 4]);
    // one witness stack with a single 2-byte item
    tx.extend_from_slice(&[1, 2, 0xaa, 0xbb]);
    tx.extend_from_slice(&legacy[legacy.len() - 4..]);
    tx
}


fn block(seed: u8, txs: &[Vec<u8>]) -> Vec<u8> {
    let mut raw = vec![seed; 80];
    raw.push(txs.len() as u8);
    for tx in txs {
        raw.extend_from_slice(tx);
    }
    raw
}


fn write_blk_file(dir: &Path, file: u32, blocks: &[Vec<u8>], zero_tail: usize) -> Vec<u64> {
    let mut data = Vec::new();
    let mut offsets = Vec::new();
    for b in blocks {
        offsets.push(data.len() as u64);
        data.extend_from_slice(&Network::Main.magic());
        data.extend_from_slice(&(b.len() as u32).to_le_bytes());
        data.extend_from_slice(b);
    }
    data.resize(data.len() + zero_tail, 0);
    std::fs::write(dir.join(format!("blk{:05}.dat", file)), data).unwrap();
    offsets
}


#[test]
fn txid_ignores_witness() {
    let legacy = BitcoinBlock::parse(block(1, &[legacy_tx(7)]).into()).unwrap();
    let segwit = BitcoinBlock::parse(block(1, &[segwit_tx(7)]).into()).unwrap();
    assert_eq!(legacy.tx_hashes(), &[sha256d(&legacy_tx(7))]);
    assert_eq!(legacy.tx_hashes(), segwit.tx_hashes());
    assert_eq!(legacy.hash(), sha256d(&[1; 80]));
    assert_ne!(legacy.to_bytes(), segwit.to_bytes());
}


#[tokio::test]
async fn enumerates_files_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let b0 = block(1, &[legacy_tx(1), segwit_tx(2)]);
    let b1 = block(2, &[legacy_tx(3)]);
    let b2 = block(3, &[segwit_tx(4)]);
    let offsets0 = write_blk_file(dir.path(), 0, &[b0.clone(), b1.clone()], 64);
    let offsets1 = write_blk_file(dir.path(), 1, &[b2.clone()], 0);

    let store = DiskBlockStore::new(dir.path(), Network::Main);
    let blocks: Vec<_> = store.enumerate(Cursor::ORIGIN).try_collect().await.unwrap();

    let positions: Vec<_> = blocks.iter().map(|b| b.position).collect();
    assert_eq!(positions, vec![
        Cursor::new(0, offsets0[0]),
        Cursor::new(0, offsets0[1]),
        Cursor::new(1, offsets1[0])
    ]);
    assert_eq!(blocks[0].block.tx_hashes().len(), 2);
    assert_eq!(blocks[2].block.hash(), sha256d(&[3; 80]));
    assert_eq!(&blocks[1].block.to_bytes()[..], &b1[..]);

    let resumed: Vec<_> = store.enumerate(Cursor::new(0, offsets0[1])).try_collect().await.unwrap();
    assert_eq!(resumed.len(), 2);
    assert_eq!(resumed[0].block.hash(), blocks[1].block.hash());
}


#[tokio::test]
async fn missing_directory_is_an_empty_source() {
    let dir = tempfile::tempdir().unwrap();
    let store = DiskBlockStore::new(dir.path().join("nope"), Network::Main);
    let blocks: Vec<_> = store.enumerate(Cursor::ORIGIN).try_collect().await.unwrap();
    assert!(blocks.is_empty());
}


#[tokio::test]
async fn wrong_network_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    write_blk_file(dir.path(), 0, &[block(1, &[legacy_tx(1)])], 0);
    let store = DiskBlockStore::new(dir.path(), Network::Test);
    let result: anyhow::Result<Vec<_>> = store.enumerate(Cursor::ORIGIN).try_collect().await;
    assert!(result.is_err());
}


#[tokio::test]
async fn truncated_tail_ends_the_stream() {
    let dir = tempfile::tempdir().unwrap();
    let b0 = block(1, &[legacy_tx(1)]);
    write_blk_file(dir.path(), 0, &[b0], 0);
    let path = dir.path().join("blk00000.dat");
    let mut data = std::fs::read(&path).unwrap();
    data.extend_from_slice(&Network::Main.magic());
    data.extend_from_slice(&1000u32.to_le_bytes());
    data.extend_from_slice(&[0xab; 10]);
    std::fs::write(&path, data).unwrap();

    let store = DiskBlockStore::new(dir.path(), Network::Main);
    let blocks: Vec<_> = store.enumerate(Cursor::ORIGIN).try_collect().await.unwrap();
    assert_eq!(blocks.len(), 1);
    assert_ne!(blocks[0].block.hash(), Hash256::ZERO);
}
