//! Query planning and result merging.

/// Deduplicating merge of filter and text results.
pub mod merge;
/// Three-path hybrid search planner.
pub mod planner;

pub use merge::{SearchHit, merge};
pub use planner::{SearchPath, SearchRequest};
