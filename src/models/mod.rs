pub mod file;
pub mod finding;
pub mod report;

pub use file::*;
pub use finding::*;
pub use report::*;
