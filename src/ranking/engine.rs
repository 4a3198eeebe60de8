//! Feedback-driven weight adjustment loop

use crate::error::{CandidateRankerError, Result};
use crate::ranking::feedback::{FeedbackRecord, FeedbackStats, FeedbackStore};
use crate::ranking::scoring::calculate_final_score;
use crate::ranking::weights::{WeightVector, WeightsManager};
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Minimum feedback records before any adjustment runs.
const MIN_FEEDBACK_FOR_ADJUSTMENT: usize = 5;

/// Average predicted score on irrelevant matches above which the engine is
/// considered overconfident.
const OVERCONFIDENCE_THRESHOLD: f32 = 0.6;

/// Uniform step subtracted from every weight component on correction.
const ADJUSTMENT_STEP: f32 = 0.02;

/// Per-component deltas applied in one adjustment cycle, before
/// renormalization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeightDelta {
    pub skills: f32,
    pub experience: f32,
    pub summary: f32,
}

impl WeightDelta {
    const ZERO: WeightDelta = WeightDelta {
        skills: 0.0,
        experience: 0.0,
        summary: 0.0,
    };
}

/// Result of one weight-adjustment cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AdjustmentOutcome {
    Skipped {
        reason: String,
        feedback_count: usize,
        min_required: usize,
    },
    Adjusted {
        feedback_count: usize,
        accuracy: f32,
        previous_weights: WeightVector,
        new_weights: WeightVector,
        adjustments: WeightDelta,
    },
}

/// One feedback item as submitted by the boundary layer, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackSubmission {
    pub candidate_id: String,
    pub job_id: String,
    pub recruiter_id: String,
    pub is_relevant: bool,
    pub predicted_score: f32,
    #[serde(default)]
    pub feedback_reason: String,
}

impl FeedbackSubmission {
    /// Boundary-layer validation. The store itself assumes validated input.
    pub fn validate(&self) -> Result<()> {
        if self.candidate_id.trim().is_empty()
            || self.job_id.trim().is_empty()
            || self.recruiter_id.trim().is_empty()
        {
            return Err(CandidateRankerError::InvalidInput(
                "candidate_id, job_id, and recruiter_id must be non-empty".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.predicted_score) {
            return Err(CandidateRankerError::InvalidInput(format!(
                "predicted_score must be within [0, 1], got {}",
                self.predicted_score
            )));
        }

        Ok(())
    }
}

/// Summary of a batch feedback submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFeedbackOutcome {
    pub recorded: usize,
    pub rejected: usize,
    pub adjustment: Option<AdjustmentOutcome>,
}

/// Owns the weights manager and feedback store, and closes the loop between
/// them: recruiter feedback steers the weight vector used for future
/// rankings.
pub struct RankingEngine {
    weights: WeightsManager,
    feedback: FeedbackStore,
    window_days: i64,
}

impl RankingEngine {
    pub fn new(weights: WeightsManager, feedback: FeedbackStore, window_days: i64) -> Self {
        Self {
            weights,
            feedback,
            window_days,
        }
    }

    pub fn weights_manager(&self) -> &WeightsManager {
        &self.weights
    }

    pub fn feedback_store(&self) -> &FeedbackStore {
        &self.feedback
    }

    /// Snapshot of the current weight vector.
    pub fn weights(&self) -> WeightVector {
        self.weights.get()
    }

    /// Combine component scores into one final score using the current
    /// adaptive weights.
    pub fn adaptive_score(
        &self,
        skills_score: f32,
        experience_score: f32,
        summary_score: f32,
    ) -> f32 {
        calculate_final_score(
            skills_score,
            experience_score,
            summary_score,
            &self.weights.get(),
        )
    }

    /// Feedback statistics over the engine's look-back window.
    pub fn stats(&self, recruiter_id: Option<&str>) -> FeedbackStats {
        self.feedback.stats(recruiter_id, self.window_days)
    }

    /// Run one adjustment cycle over the most recent `limit` feedback
    /// records.
    ///
    /// Skips entirely below the minimum record count; weight churn on tiny
    /// samples is disallowed. The correction is one-directional: relevant
    /// matches leave the mixture unchanged, and only a high average predicted
    /// score on irrelevant matches steps every component down by a fixed
    /// amount before renormalization.
    pub fn adjust_weights_from_feedback(&self, limit: usize) -> AdjustmentOutcome {
        let stats = self.feedback.stats(None, self.window_days);

        if stats.total_feedback < MIN_FEEDBACK_FOR_ADJUSTMENT {
            info!(
                "event=insufficient_feedback_for_adjustment total={} min_required={}",
                stats.total_feedback, MIN_FEEDBACK_FOR_ADJUSTMENT
            );
            return AdjustmentOutcome::Skipped {
                reason: "insufficient_feedback".to_string(),
                feedback_count: stats.total_feedback,
                min_required: MIN_FEEDBACK_FOR_ADJUSTMENT,
            };
        }

        let recent = self.feedback.history(limit);
        let irrelevant: Vec<&FeedbackRecord> =
            recent.iter().filter(|r| !r.is_relevant).collect();

        let current = self.weights.get();
        let mut adjustments = WeightDelta::ZERO;

        if !irrelevant.is_empty() && stats.avg_predicted_score_irrelevant > OVERCONFIDENCE_THRESHOLD
        {
            adjustments.skills -= ADJUSTMENT_STEP;
            adjustments.experience -= ADJUSTMENT_STEP;
            adjustments.summary -= ADJUSTMENT_STEP;
        }

        let new_weights = self.weights.update(
            Some(current.skills + adjustments.skills),
            Some(current.experience + adjustments.experience),
            Some(current.summary + adjustments.summary),
        );

        info!(
            "event=weights_adjusted_from_feedback feedback_count={} accuracy={:.2} \
             old_skills={:.4} old_experience={:.4} old_summary={:.4} \
             new_skills={:.4} new_experience={:.4} new_summary={:.4}",
            stats.total_feedback,
            stats.accuracy,
            current.skills,
            current.experience,
            current.summary,
            new_weights.skills,
            new_weights.experience,
            new_weights.summary
        );

        AdjustmentOutcome::Adjusted {
            feedback_count: stats.total_feedback,
            accuracy: stats.accuracy,
            previous_weights: current,
            new_weights,
            adjustments,
        }
    }

    /// Record one feedback item, then optionally run an adjustment cycle.
    pub fn record_and_adjust(
        &self,
        submission: &FeedbackSubmission,
        auto_adjust: bool,
        limit: usize,
    ) -> (FeedbackRecord, Option<AdjustmentOutcome>) {
        let record = self.feedback.record(
            &submission.candidate_id,
            &submission.job_id,
            &submission.recruiter_id,
            submission.is_relevant,
            submission.predicted_score,
            &submission.feedback_reason,
        );

        let adjustment = if auto_adjust {
            Some(self.adjust_weights_from_feedback(limit))
        } else {
            None
        };

        (record, adjustment)
    }

    /// Record a batch of feedback items sequentially. Each item is validated
    /// independently; a rejected item never aborts the rest. The adjustment
    /// cycle runs exactly once after the whole batch, not per item, so bursty
    /// submissions cannot thrash the weights.
    pub fn record_batch(
        &self,
        submissions: &[FeedbackSubmission],
        auto_adjust: bool,
        limit: usize,
    ) -> BatchFeedbackOutcome {
        let mut recorded = 0;
        let mut rejected = 0;

        for submission in submissions {
            match submission.validate() {
                Ok(()) => {
                    self.feedback.record(
                        &submission.candidate_id,
                        &submission.job_id,
                        &submission.recruiter_id,
                        submission.is_relevant,
                        submission.predicted_score,
                        &submission.feedback_reason,
                    );
                    recorded += 1;
                }
                Err(e) => {
                    warn!(
                        "event=feedback_rejected candidate_id={} job_id={} error={}",
                        submission.candidate_id, submission.job_id, e
                    );
                    rejected += 1;
                }
            }
        }

        let adjustment = if auto_adjust {
            Some(self.adjust_weights_from_feedback(limit))
        } else {
            None
        };

        BatchFeedbackOutcome {
            recorded,
            rejected,
            adjustment,
        }
    }
}
