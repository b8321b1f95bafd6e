//! Fuzzy search over the registry.
//!
//! A linear scan, not an index: every stored file and every file inside
//! every batch is scored against the query with a windowed similarity
//! ratio, thresholded, and ranked. Result sets are cached per user for the
//! paging and filter callbacks.

pub mod cache;
pub mod results;
pub mod similarity;

pub use cache::{SearchCache, SearchState};
pub use results::{
    search, Page, PageItem, ScoredBatch, ScoredFile, ScoredMember, SearchResults, ViewFilter,
    MATCH_THRESHOLD, PAGE_SIZE,
};
pub use similarity::partial_ratio;
