use anyhow::{ensure, Context};
use bytes::Bytes;
use sha2::{Digest, Sha256};
use sqd_primitives::{Block, Hash256};


const HEADER_SIZE: usize = 80;


#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Network {
    Main,
    Test,
    Regtest
}


impl Network {
    /// Bytes that open every record of a `blk*.dat` file.
    pub fn magic(&self) -> [u8; 4] {
        match self {
            Network::Main => [0xf9, 0xbe, 0xb4, 0xd9],
            Network::Test => [0x0b, 0x11, 0x09, 0x07],
            Network::Regtest => [0xfa, 0xbf, 0xb5, 0xda]
        }
    }
}


/// Bitcoin block kept in its serialized form.
///
/// Only the block hash and the transaction ids are extracted, nothing is validated.
#[derive(Debug, Clone)]
pub struct BitcoinBlock {
    hash: Hash256,
    txids: Vec<Hash256>,
    raw: Bytes
}


impl BitcoinBlock {
    pub fn parse(raw: Bytes) -> anyhow::Result<Self> {
        ensure!(
            raw.len() >= HEADER_SIZE,
            "block is only {} bytes long, while the header alone takes {}",
            raw.len(),
            HEADER_SIZE
        );

        let hash = sha256d(&raw[0..HEADER_SIZE]);

        let mut reader = Reader::new(&raw);
        reader.skip(HEADER_SIZE)?;

        let tx_count = reader.varint()?;
        let mut txids = Vec::with_capacity(tx_count.min(16 * 1024) as usize);
        for i in 0..tx_count {
            let txid = read_tx(&mut reader).with_context(|| {
                format!("failed to read transaction #{} of block {}", i, hash)
            })?;
            txids.push(txid);
        }

        Ok(Self {
            hash,
            txids,
            raw
        })
    }
}


impl Block for BitcoinBlock {
    fn hash(&self) -> Hash256 {
        self.hash
    }

    fn tx_hashes(&self) -> &[Hash256] {
        &self.txids
    }

    fn to_bytes(&self) -> Bytes {
        self.raw.clone()
    }
}


fn read_tx(reader: &mut Reader<'_>) -> anyhow::Result<Hash256> {
    let version = reader.take(4)?;

    let segwit = reader.peek(2) == Some(&[0x00, 0x01][..]);
    if segwit {
        reader.skip(2)?;
    }

    let body_start = reader.pos;

    let inputs = reader.varint()?;
    for _ in 0..inputs {
        reader.skip(36)?;
        let script_len = reader.varint()?;
        reader.skip_u64(script_len)?;
        reader.skip(4)?;
    }

    let outputs = reader.varint()?;
    for _ in 0..outputs {
        reader.skip(8)?;
        let script_len = reader.varint()?;
        reader.skip_u64(script_len)?;
    }

    let body = &reader.data[body_start..reader.pos];

    if segwit {
        for _ in 0..inputs {
            let items = reader.varint()?;
            for _ in 0..items {
                let len = reader.varint()?;
                reader.skip_u64(len)?;
            }
        }
    }

    let lock_time = reader.take(4)?;

    // txid never covers the witness part
    let mut hasher = Sha256::new();
    hasher.update(version);
    hasher.update(body);
    hasher.update(lock_time);
    let first = hasher.finalize();
    Ok(Hash256::from_bytes(Sha256::digest(first).into()))
}


pub fn sha256d(data: &[u8]) -> Hash256 {
    let first = Sha256::digest(data);
    Hash256::from_bytes(Sha256::digest(first).into())
}


struct Reader<'a> {
    data: &'a [u8],
    pos: usize
}


impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn peek(&self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        self.data.get(self.pos..end)
    }

    fn take(&mut self, len: usize) -> anyhow::Result<&'a [u8]> {
        let slice = self.peek(len).with_context(|| {
            format!("unexpected end of data at offset {}", self.pos)
        })?;
        self.pos += len;
        Ok(slice)
    }

    fn skip(&mut self, len: usize) -> anyhow::Result<()> {
        self.take(len).map(|_| ())
    }

    fn skip_u64(&mut self, len: u64) -> anyhow::Result<()> {
        let len = usize::try_from(len).context("length does not fit into memory")?;
        self.skip(len)
    }

    fn varint(&mut self) -> anyhow::Result<u64> {
        let tag = self.take(1)?[0];
        let value = match tag {
            0xfd => u16::from_le_bytes(self.take(2)?.try_into()?) as u64,
            0xfe => u32::from_le_bytes(self.take(4)?.try_into()?) as u64,
            0xff => u64::from_le_bytes(self.take(8)?.try_into()?),
            n => n as u64
        };
        Ok(value)
    }
}
