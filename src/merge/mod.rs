//! Ordered PDF concatenation.

mod merger;
mod metadata;

pub use merger::{MergeSummary, Merger};
