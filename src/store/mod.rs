//! Persistence: delimited segment / result tables and the segment cache.

pub mod cache;
pub mod table;

pub use cache::{cache_key, CacheError, DirCache, MemoryCache, SegmentCache};
pub use table::{
    parse_results, parse_seconds, read_results, write_results, write_results_to, SegmentLabel,
    SegmentRecord, SegmentTable, TableError, RESULT_COLUMNS, SEGMENT_COLUMNS,
};
