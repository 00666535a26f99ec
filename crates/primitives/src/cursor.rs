use std::fmt::{Display, Formatter};
use std::str::FromStr;


/// Position of a block record within an ordered sequence of block files.
///
/// Ordering is lexicographic over `(file, offset)`, which matches the order
/// in which a block source yields blocks.
#[derive(Copy, Clone, Debug, Default, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct Cursor {
    pub file: u32,
    pub offset: u64
}


impl Cursor {
    /// Start of the very first file.
    pub const ORIGIN: Cursor = Cursor { file: 0, offset: 0 };

    pub const fn new(file: u32, offset: u64) -> Self {
        Self { file, offset }
    }
}


impl Display for Cursor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file, self.offset)
    }
}


impl FromStr for Cursor {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (file, offset) = s.trim().split_once(':').ok_or("expected <file>:<offset>")?;
        let file = file.parse().map_err(|_| "invalid file index")?;
        let offset = offset.parse().map_err(|_| "invalid byte offset")?;
        Ok(Self { file, offset })
    }
}
