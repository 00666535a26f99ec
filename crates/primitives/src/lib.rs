mod block;
mod cursor;
mod hash;


pub use block::*;
pub use cursor::*;
pub use hash::*;

