pub mod file;
pub mod full;
pub mod hunk;

pub use file::SourceFilter;
pub use full::FileRangeMap;
pub use hunk::ChangedRange;
