//! Persistent similarity index over document chunks.

pub mod flat;
mod store;

pub use flat::FlatIpIndex;
pub use store::SimilarityIndex;
