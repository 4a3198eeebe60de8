//! Candidate scoring, adaptive weights, and recruiter feedback

pub mod engine;
pub mod feedback;
pub mod scoring;
pub mod tfidf;
pub mod weights;

pub use engine::{AdjustmentOutcome, BatchFeedbackOutcome, FeedbackSubmission, RankingEngine};
pub use feedback::{FeedbackRecord, FeedbackStats, FeedbackStore};
pub use scoring::ScoringEngine;
pub use weights::{WeightVector, WeightsManager};
