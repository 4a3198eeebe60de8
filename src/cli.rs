//! CLI interface for the candidate ranker

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "candidate-ranker")]
#[command(about = "Adaptive job-candidate ranking with feedback-driven weights")]
#[command(
    long_about = "Rank candidate profiles against job descriptions using skill extraction, lexical and semantic similarity, and an adaptive weight vector steered by recruiter feedback"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Rank candidates against a job description
    Rank {
        /// Path to job description file (TXT, MD)
        #[arg(short, long)]
        job: PathBuf,

        /// Path to candidates JSON file
        #[arg(short = 'i', long)]
        candidates: PathBuf,

        /// Score with dense-embedding similarity instead of lexical similarity
        #[arg(long)]
        semantic: bool,

        /// Emit machine-readable JSON instead of the ranked table
        #[arg(long)]
        json: bool,
    },

    /// Extract structured requirements from a job description
    Extract {
        /// Path to job description file (TXT, MD)
        #[arg(short, long)]
        job: PathBuf,

        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Index candidates into the vector store for semantic search
    Index {
        /// Path to candidates JSON file
        #[arg(short = 'i', long)]
        candidates: PathBuf,

        /// Recruiter owning the indexed candidates
        #[arg(short, long)]
        recruiter: Option<String>,
    },

    /// Search indexed candidates by semantic similarity
    Search {
        /// Query text (a job description or skill phrase)
        query: String,

        /// Restrict results to one recruiter's candidates
        #[arg(short, long)]
        recruiter: Option<String>,

        /// Number of results to return
        #[arg(short = 'k', long, default_value_t = 5)]
        top_k: usize,

        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect indexed candidates
    Candidates {
        #[command(subcommand)]
        action: CandidatesAction,
    },

    /// Inspect or change the adaptive scoring weights
    Weights {
        #[command(subcommand)]
        action: WeightsAction,
    },

    /// Record recruiter feedback and steer the weights
    Feedback {
        #[command(subcommand)]
        action: FeedbackAction,
    },
}

#[derive(Subcommand)]
pub enum CandidatesAction {
    /// List indexed candidates
    List {
        /// Restrict to one recruiter's candidates
        #[arg(short, long)]
        recruiter: Option<String>,

        /// Maximum number of candidates to list
        #[arg(short, long)]
        limit: Option<usize>,

        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Find an indexed candidate by name
    Find {
        /// Candidate name (case-insensitive exact match)
        name: String,

        /// Restrict to one recruiter's candidates
        #[arg(short, long)]
        recruiter: Option<String>,

        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Show vector index and embedding cache statistics
    Stats {
        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum WeightsAction {
    /// Show the current weight vector
    Show {
        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Set weight components (clamped to their bounds, then renormalized)
    Set {
        /// Skills-overlap weight
        #[arg(long)]
        skills: Option<f32>,

        /// Experience-fit weight
        #[arg(long)]
        experience: Option<f32>,

        /// Summary-similarity weight
        #[arg(long)]
        summary: Option<f32>,
    },

    /// Reset the weight vector to the defaults
    Reset,
}

#[derive(Subcommand)]
pub enum FeedbackAction {
    /// Record one relevance judgment
    Add {
        /// Candidate id the judgment applies to
        #[arg(long)]
        candidate: String,

        /// Job id the judgment applies to
        #[arg(long)]
        job: String,

        /// Recruiter submitting the judgment
        #[arg(long, default_value = "default")]
        recruiter: String,

        /// Mark the match relevant (absent records it as irrelevant)
        #[arg(long)]
        relevant: bool,

        /// Score the engine predicted for this match, in [0, 1]
        #[arg(long)]
        score: f32,

        /// Free-text reason for the judgment
        #[arg(long)]
        reason: Option<String>,

        /// Run the weight adjustment immediately after recording
        #[arg(long)]
        adjust: bool,
    },

    /// Record a batch of judgments from a JSON file
    Batch {
        /// Path to feedback JSON file (array of submissions)
        file: PathBuf,

        /// Run the weight adjustment once after the whole batch
        #[arg(long)]
        adjust: bool,
    },

    /// Show feedback statistics over a recent window
    Stats {
        /// Restrict to one recruiter's feedback
        #[arg(short, long)]
        recruiter: Option<String>,

        /// Window size in days
        #[arg(short, long, default_value_t = 30)]
        days: i64,

        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the most recent feedback records
    History {
        /// Maximum number of records to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,

        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the feedback-driven weight adjustment on demand
    Adjust,
}

/// Validate file extension
pub fn validate_file_extension(path: &Path, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}

/// Validate a predicted score before it reaches the feedback store
pub fn validate_score(value: f32) -> Result<(), String> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(format!(
            "Invalid predicted score: {}. Must be between 0.0 and 1.0",
            value
        ))
    }
}
