pub mod gatherer;
pub mod reader;

pub use gatherer::{GatherOptions, LocalGatherer};
pub use reader::{ByteReader, LocalFileReader, MemoryReader};
