//! Candidate vector index and semantic retrieval

pub mod service;
pub mod store;

pub use service::{CandidateIndex, IndexStats, JobMatches, JobQuery};
pub use store::{EntryMetadata, VectorEntry, VectorStore};
