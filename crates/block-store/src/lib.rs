mod bitcoin;
mod disk;
mod memory;
mod types;


pub use bitcoin::*;
pub use disk::DiskBlockStore;
pub use memory::MemoryBlockSource;
pub use types::*;
