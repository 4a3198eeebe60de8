//! Adaptive candidate ranking library

pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extraction;
pub mod index;
pub mod model;
pub mod ranking;

pub use config::Config;
pub use error::{CandidateRankerError, Result};
