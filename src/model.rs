//! Candidate profile records

use serde::{Deserialize, Serialize};

/// A parsed applicant profile as handed over by the upstream parsing pipeline.
///
/// The ranking core treats candidates as read-only input; scoring produces a
/// derived copy via [`Candidate::with_score`] and never mutates in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub summary: String,
    pub experience_years: f32,
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_score: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_breakdown: Option<ScoreBreakdown>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_reasons: Vec<String>,
}

/// Per-signal component scores attached to a ranked candidate, each in [0, 1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub skills_score: f32,
    pub experience_score: f32,
    pub summary_similarity: f32,
    #[serde(default)]
    pub semantic_score: f32,
}

impl Candidate {
    /// Normalization constructor: trims skills, drops empties, de-duplicates
    /// case-insensitively (first display-case wins), and clamps experience
    /// to be non-negative. All candidate construction funnels through here so
    /// the rest of the core can assume clean fields.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        summary: impl Into<String>,
        experience_years: f32,
        skills: Vec<String>,
    ) -> Self {
        Self {
            id: id.into().trim().to_string(),
            name: name.into().trim().to_string(),
            summary: summary.into().trim().to_string(),
            experience_years: experience_years.max(0.0),
            skills: normalize_skills(skills),
            match_score: None,
            score_breakdown: None,
            match_reasons: Vec::new(),
        }
    }

    /// Split a comma-joined skills string (the index metadata encoding) back
    /// into a skill list.
    pub fn split_skills(text: &str) -> Vec<String> {
        normalize_skills(text.split(',').map(|s| s.to_string()).collect())
    }

    /// Lowercased skill list for case-insensitive matching.
    pub fn skills_lowered(&self) -> Vec<String> {
        self.skills.iter().map(|s| s.to_lowercase()).collect()
    }

    /// Canonical profile text used both for indexing and lexical similarity:
    /// summary followed by the space-joined skills. Falls back to a
    /// placeholder so no candidate is ever represented by an empty document.
    pub fn document_text(&self) -> String {
        let skill_text = self.skills.join(" ");
        let combined = format!("{} {}", self.summary, skill_text);
        let combined = combined.trim();

        if combined.is_empty() {
            "candidate profile".to_string()
        } else {
            combined.to_string()
        }
    }

    /// Derived copy carrying the final score, its breakdown, and the
    /// recruiter-facing match reasons.
    pub fn with_score(
        &self,
        match_score: f32,
        breakdown: ScoreBreakdown,
        reasons: Vec<String>,
    ) -> Self {
        let mut scored = self.clone();
        scored.match_score = Some(match_score);
        scored.score_breakdown = Some(breakdown);
        scored.match_reasons = reasons;
        scored
    }
}

fn normalize_skills(skills: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut normalized = Vec::new();

    for skill in skills {
        let trimmed = skill.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            normalized.push(trimmed.to_string());
        }
    }

    normalized
}
