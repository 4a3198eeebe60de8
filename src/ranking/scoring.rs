//! Component scores and batch candidate ranking

use crate::embedding::EmbeddingService;
use crate::error::{CandidateRankerError, Result};
use crate::extraction::{JobRequirements, RequirementExtractor};
use crate::model::{Candidate, ScoreBreakdown};
use crate::ranking::tfidf::TfidfVectorizer;
use crate::ranking::weights::WeightVector;
use log::error;
use std::collections::HashSet;
use std::sync::Arc;

/// Round to 4 decimal places, the precision used everywhere scores are
/// emitted.
pub fn round4(value: f32) -> f32 {
    (value * 10_000.0).round() / 10_000.0
}

/// Fraction of the required skills the candidate covers. An unconstrained
/// job (no required skills) scores 1.0 for everyone rather than penalizing
/// candidates for a requirement that does not exist.
pub fn skills_score(required: &[String], candidate_skills_lowered: &[String]) -> f32 {
    if required.is_empty() {
        return 1.0;
    }

    let candidate: HashSet<&str> = candidate_skills_lowered
        .iter()
        .map(|s| s.as_str())
        .collect();
    let matched = required
        .iter()
        .filter(|skill| candidate.contains(skill.as_str()))
        .count();

    matched as f32 / required.len() as f32
}

/// Linear partial credit against the minimum experience requirement,
/// clamped to [0, 1].
pub fn experience_score(candidate_years: f32, min_experience: u32) -> f32 {
    if min_experience == 0 {
        return 1.0;
    }
    if candidate_years >= min_experience as f32 {
        return 1.0;
    }

    (candidate_years / min_experience as f32).max(0.0)
}

/// Weighted mixture of the component scores, rounded to 4 decimals.
pub fn calculate_final_score(
    skills: f32,
    experience: f32,
    similarity: f32,
    weights: &WeightVector,
) -> f32 {
    round4(skills * weights.skills + experience * weights.experience + similarity * weights.summary)
}

/// Human-readable reasons behind one candidate's score.
pub fn build_reasoning(
    requirements: &JobRequirements,
    candidate: &Candidate,
    breakdown: &ScoreBreakdown,
    use_semantic: bool,
) -> Vec<String> {
    let mut reasons = Vec::new();
    let candidate_skills = candidate.skills_lowered();

    let matched: Vec<&str> = requirements
        .required_skills
        .iter()
        .filter(|skill| candidate_skills.contains(skill))
        .map(|skill| skill.as_str())
        .collect();
    let missing: Vec<&str> = requirements
        .required_skills
        .iter()
        .filter(|skill| !candidate_skills.contains(skill))
        .map(|skill| skill.as_str())
        .collect();

    if requirements.required_skills.is_empty() {
        reasons.push("No specific skills required for this role".to_string());
    } else if !matched.is_empty() {
        reasons.push(format!(
            "Matches {} of {} required skills: {}",
            matched.len(),
            requirements.required_skills.len(),
            matched.join(", ")
        ));
    }

    if !missing.is_empty() {
        reasons.push(format!("Missing required skills: {}", missing.join(", ")));
    }

    if requirements.min_experience_years > 0 {
        if breakdown.experience_score >= 1.0 {
            reasons.push(format!(
                "Meets the {}-year minimum experience requirement",
                requirements.min_experience_years
            ));
        } else {
            reasons.push(format!(
                "Below the {}-year minimum experience requirement with {:.1} years",
                requirements.min_experience_years, candidate.experience_years
            ));
        }
    }

    if use_semantic {
        reasons.push(format!(
            "Semantic similarity to the job description: {:.2}",
            breakdown.semantic_score
        ));
    } else {
        reasons.push(format!(
            "Summary similarity to the job description: {:.2}",
            breakdown.summary_similarity
        ));
    }

    reasons
}

/// Batch scoring over one job description.
///
/// Lexical similarity is fit over the corpus of the moment (job plus this
/// batch of candidate texts), so summary scores are relative to the batch
/// and not comparable across separate ranking calls.
pub struct ScoringEngine {
    extractor: RequirementExtractor,
    vectorizer: TfidfVectorizer,
    embeddings: Arc<EmbeddingService>,
}

impl ScoringEngine {
    pub fn new(embeddings: Arc<EmbeddingService>) -> Result<Self> {
        Ok(Self {
            extractor: RequirementExtractor::new()?,
            vectorizer: TfidfVectorizer::new(),
            embeddings,
        })
    }

    pub fn extractor(&self) -> &RequirementExtractor {
        &self.extractor
    }

    /// Score and rank a candidate batch against a job description.
    ///
    /// Scoring is best-effort enrichment: any computation failure is logged
    /// and the original unscored list comes back unchanged. Results are
    /// sorted by final score descending; ties keep input order.
    pub async fn score_candidates(
        &self,
        job_description: &str,
        candidates: Vec<Candidate>,
        weights: &WeightVector,
        use_semantic: bool,
    ) -> Vec<Candidate> {
        if job_description.trim().is_empty() || candidates.is_empty() {
            return candidates;
        }

        match self.try_score(job_description, &candidates, weights, use_semantic) {
            Ok(ranked) => ranked,
            Err(e) => {
                error!("event=candidate_scoring_failed error={}", e);
                candidates
            }
        }
    }

    fn try_score(
        &self,
        job_description: &str,
        candidates: &[Candidate],
        weights: &WeightVector,
        use_semantic: bool,
    ) -> Result<Vec<Candidate>> {
        let job_text = job_description.trim();
        let requirements = self.extractor.parse(job_text);

        let mut corpus: Vec<String> = Vec::with_capacity(candidates.len() + 1);
        corpus.push(job_text.to_string());
        corpus.extend(candidates.iter().map(|c| c.document_text()));

        let vectors = self.vectorizer.fit_transform(&corpus)?;
        let (job_vector, candidate_vectors) = vectors
            .split_first()
            .ok_or_else(|| CandidateRankerError::Scoring("empty scoring corpus".to_string()))?;

        // None when semantic mode is off or the backend is unavailable; the
        // final score then falls back to lexical similarity.
        let semantic_scores = if use_semantic {
            self.semantic_scores(job_text, candidates)?
        } else {
            None
        };
        let semantic_active = semantic_scores.is_some();

        let mut ranked: Vec<Candidate> = candidates
            .iter()
            .enumerate()
            .map(|(i, candidate)| {
                let skills = skills_score(&requirements.required_skills, &candidate.skills_lowered());
                let experience =
                    experience_score(candidate.experience_years, requirements.min_experience_years);
                let summary_similarity = job_vector.cosine_similarity(&candidate_vectors[i]);
                let semantic = semantic_scores.as_ref().map(|scores| scores[i]);

                let similarity = semantic.unwrap_or(summary_similarity);
                let final_score = calculate_final_score(skills, experience, similarity, weights);

                let breakdown = ScoreBreakdown {
                    skills_score: round4(skills),
                    experience_score: round4(experience),
                    summary_similarity: round4(summary_similarity),
                    semantic_score: round4(semantic.unwrap_or(0.0)),
                };
                let reasons =
                    build_reasoning(&requirements, candidate, &breakdown, semantic_active);

                candidate.with_score(final_score, breakdown, reasons)
            })
            .collect();

        ranked.sort_by(|a, b| {
            let a_score = a.match_score.unwrap_or(0.0);
            let b_score = b.match_score.unwrap_or(0.0);
            b_score.total_cmp(&a_score)
        });

        Ok(ranked)
    }

    fn semantic_scores(
        &self,
        job_text: &str,
        candidates: &[Candidate],
    ) -> Result<Option<Vec<f32>>> {
        let job_embedding = match self.embeddings.embed(job_text) {
            Some(embedding) => embedding,
            None => return Ok(None),
        };

        let texts: Vec<String> = candidates.iter().map(|c| c.document_text()).collect();
        let embeddings = match self.embeddings.embed_batch(&texts) {
            Some(embeddings) => embeddings,
            None => return Ok(None),
        };

        let mut scores = Vec::with_capacity(embeddings.len());
        for embedding in &embeddings {
            scores.push(EmbeddingService::cosine_similarity(
                &job_embedding,
                embedding,
            )?);
        }

        Ok(Some(scores))
    }
}
