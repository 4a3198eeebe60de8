//! Skill, experience, and keyword extraction from raw job descriptions

use crate::error::{CandidateRankerError, Result};
use aho_corasick::AhoCorasick;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Maximum number of free-text keywords retained per job description.
const MAX_KEYWORDS: usize = 15;

/// Structured requirements derived from a job description.
///
/// Recomputed per request; there is no persistent identity. Skills are
/// lowercase and sorted so equal inputs always produce identical output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRequirements {
    pub required_skills: Vec<String>,
    pub min_experience_years: u32,
    pub keywords: Vec<String>,
}

/// Deterministic job-description parser.
///
/// Skill detection is a case-insensitive substring scan against a fixed
/// vocabulary. Overlapping matches are all reported, so "javascript" in the
/// text yields both `javascript` and `java`. Minimum experience takes the
/// smallest number found near year/experience phrasing, a conservative floor
/// rather than a maximum.
pub struct RequirementExtractor {
    skill_matcher: AhoCorasick,
    vocabulary: Vec<String>,
    experience_patterns: Vec<Regex>,
    token_regex: Regex,
    stop_words: HashSet<String>,
}

impl RequirementExtractor {
    pub fn new() -> Result<Self> {
        let vocabulary = Self::default_skill_vocabulary();

        let skill_matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(&vocabulary)
            .map_err(|e| {
                CandidateRankerError::Extraction(format!("Failed to build skill matcher: {}", e))
            })?;

        let experience_patterns = vec![
            Regex::new(r"(?:minimum|min)\s*(\d+)\+?\s*years?")
                .expect("Invalid minimum-years regex"),
            Regex::new(r"(\d+)\+?\s*years?\s*(?:of\s*)?(?:experience|exp)")
                .expect("Invalid years-of-experience regex"),
            Regex::new(r"experience\s*(?:of\s*)?(\d+)\+?\s*years?")
                .expect("Invalid experience-of-years regex"),
        ];

        let token_regex =
            Regex::new(r"[a-zA-Z][a-zA-Z\-\.\+]{1,}").expect("Invalid keyword token regex");

        Ok(Self {
            skill_matcher,
            vocabulary,
            experience_patterns,
            token_regex,
            stop_words: Self::default_stop_words(),
        })
    }

    /// Parse a job description into structured requirements.
    ///
    /// Never errors; blank or unparseable input degrades to the empty
    /// structure.
    pub fn parse(&self, job_description: &str) -> JobRequirements {
        if job_description.trim().is_empty() {
            return JobRequirements::default();
        }

        let lowered = job_description.to_lowercase();

        JobRequirements {
            required_skills: self.extract_skills(&lowered),
            min_experience_years: self.extract_min_experience(&lowered),
            keywords: self.extract_keywords(&lowered),
        }
    }

    fn extract_skills(&self, lowered: &str) -> Vec<String> {
        let mut matched: HashSet<usize> = HashSet::new();

        // Overlapping iteration reports every vocabulary entry contained in
        // the text, including entries nested inside longer matches.
        for m in self.skill_matcher.find_overlapping_iter(lowered) {
            matched.insert(m.pattern().as_usize());
        }

        let mut skills: Vec<String> = matched
            .into_iter()
            .map(|idx| self.vocabulary[idx].clone())
            .collect();
        skills.sort();
        skills
    }

    fn extract_min_experience(&self, lowered: &str) -> u32 {
        let mut years: Vec<u32> = Vec::new();

        for pattern in &self.experience_patterns {
            for caps in pattern.captures_iter(lowered) {
                if let Some(value) = caps.get(1) {
                    if let Ok(parsed) = value.as_str().parse::<u32>() {
                        years.push(parsed);
                    }
                }
            }
        }

        years.into_iter().min().unwrap_or(0)
    }

    fn extract_keywords(&self, lowered: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut keywords = Vec::new();

        for token in self.token_regex.find_iter(lowered) {
            let token = token.as_str();
            if token.len() <= 2 || self.stop_words.contains(token) {
                continue;
            }
            if seen.insert(token.to_string()) {
                keywords.push(token.to_string());
            }
            if keywords.len() >= MAX_KEYWORDS {
                break;
            }
        }

        keywords
    }

    fn default_skill_vocabulary() -> Vec<String> {
        vec![
            "python", "flask", "django", "fastapi", "sql", "postgresql", "mysql",
            "mongodb", "redis", "docker", "kubernetes", "aws", "azure", "gcp",
            "javascript", "typescript", "react", "node.js", "node", "java",
            "spring", "c++", "c#", "git", "rest", "graphql", "pandas", "numpy",
            "scikit-learn", "machine learning", "nlp", "langchain",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn default_stop_words() -> HashSet<String> {
        vec![
            "the", "and", "or", "with", "for", "from", "that", "this", "into",
            "your", "you", "our", "are", "have", "has", "will", "should", "must",
            "years", "year", "experience", "developer", "engineer", "candidate",
            "role", "job", "required", "preferred",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }
}
