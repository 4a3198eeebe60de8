//! Sparse TF-IDF vectorization for lexical similarity

use crate::error::{CandidateRankerError, Result};
use regex::Regex;
use std::collections::{BTreeSet, HashMap, HashSet};

/// L2-normalized sparse document vector. Term indices are sorted ascending so
/// two vectors from the same fit can be compared with a merge-join dot
/// product.
#[derive(Debug, Clone)]
pub struct DocumentVector {
    terms: Vec<(usize, f32)>,
}

impl DocumentVector {
    /// Cosine similarity against another vector from the same `fit_transform`
    /// call. Vectors are already unit length, so the dot product is the
    /// cosine. An all-zero vector (document made only of stop words) yields
    /// 0.0 against everything.
    pub fn cosine_similarity(&self, other: &DocumentVector) -> f32 {
        let mut dot = 0.0;
        let mut a = self.terms.iter().peekable();
        let mut b = other.terms.iter().peekable();

        while let (Some((ai, av)), Some((bi, bv))) = (a.peek(), b.peek()) {
            match ai.cmp(bi) {
                std::cmp::Ordering::Less => {
                    a.next();
                }
                std::cmp::Ordering::Greater => {
                    b.next();
                }
                std::cmp::Ordering::Equal => {
                    dot += av * bv;
                    a.next();
                    b.next();
                }
            }
        }

        dot
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Bag-of-words TF-IDF vectorizer.
///
/// Fits vocabulary and document frequencies over the corpus handed to a
/// single `fit_transform` call, so the resulting scores are relative to that
/// batch. Term weighting uses the smoothed inverse document frequency
/// `ln((1+n)/(1+df)) + 1` with raw term counts, followed by L2
/// normalization.
pub struct TfidfVectorizer {
    token_regex: Regex,
    stop_words: HashSet<&'static str>,
}

impl TfidfVectorizer {
    pub fn new() -> Self {
        Self {
            token_regex: Regex::new(r"\b\w\w+\b").expect("Invalid token regex"),
            stop_words: english_stop_words(),
        }
    }

    /// Vectorize every document in the corpus.
    ///
    /// Errors when the corpus yields an empty vocabulary (every token was a
    /// stop word or too short); callers treat that as "similarity cannot be
    /// computed" rather than as zero similarity.
    pub fn fit_transform(&self, documents: &[String]) -> Result<Vec<DocumentVector>> {
        let tokenized: Vec<Vec<String>> = documents.iter().map(|d| self.tokenize(d)).collect();

        // Alphabetical vocabulary keeps term indices deterministic.
        let terms: BTreeSet<&String> = tokenized.iter().flatten().collect();
        let vocabulary: HashMap<&String, usize> = terms
            .into_iter()
            .enumerate()
            .map(|(index, term)| (term, index))
            .collect();

        if vocabulary.is_empty() {
            return Err(CandidateRankerError::Scoring(
                "empty vocabulary; documents contain only stop words".to_string(),
            ));
        }

        let mut document_frequency = vec![0usize; vocabulary.len()];
        for tokens in &tokenized {
            let mut seen_in_doc = HashSet::new();
            for token in tokens {
                if let Some(&index) = vocabulary.get(token) {
                    if seen_in_doc.insert(index) {
                        document_frequency[index] += 1;
                    }
                }
            }
        }

        let corpus_size = documents.len() as f32;
        let idf: Vec<f32> = document_frequency
            .iter()
            .map(|&df| ((1.0 + corpus_size) / (1.0 + df as f32)).ln() + 1.0)
            .collect();

        let vectors = tokenized
            .iter()
            .map(|tokens| self.build_vector(tokens, &vocabulary, &idf))
            .collect();

        Ok(vectors)
    }

    fn tokenize(&self, document: &str) -> Vec<String> {
        let lowered = document.to_lowercase();
        self.token_regex
            .find_iter(&lowered)
            .map(|m| m.as_str().to_string())
            .filter(|token| !self.stop_words.contains(token.as_str()))
            .collect()
    }

    fn build_vector(
        &self,
        tokens: &[String],
        vocabulary: &HashMap<&String, usize>,
        idf: &[f32],
    ) -> DocumentVector {
        let mut counts: HashMap<usize, f32> = HashMap::new();
        for token in tokens {
            if let Some(&index) = vocabulary.get(token) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let mut terms: Vec<(usize, f32)> = counts
            .into_iter()
            .map(|(index, count)| (index, count * idf[index]))
            .collect();
        terms.sort_by_key(|(index, _)| *index);

        let norm: f32 = terms.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for term in &mut terms {
                term.1 /= norm;
            }
        }

        DocumentVector { terms }
    }
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

fn english_stop_words() -> HashSet<&'static str> {
    [
        "a", "about", "above", "across", "after", "afterwards", "again", "against",
        "all", "almost", "alone", "along", "already", "also", "although", "always",
        "am", "among", "amongst", "amount", "an", "and", "another", "any", "anyhow",
        "anyone", "anything", "anyway", "anywhere", "are", "around", "as", "at",
        "back", "be", "became", "because", "become", "becomes", "becoming", "been",
        "before", "beforehand", "behind", "being", "below", "beside", "besides",
        "between", "beyond", "both", "bottom", "but", "by", "call", "can", "cannot",
        "could", "describe", "detail", "do", "done", "down", "due", "during", "each",
        "eight", "either", "eleven", "else", "elsewhere", "empty", "enough", "etc",
        "even", "ever", "every", "everyone", "everything", "everywhere", "except",
        "few", "fifteen", "fifty", "fill", "find", "first", "five", "for", "former",
        "formerly", "forty", "found", "four", "from", "front", "full", "further",
        "get", "give", "go", "had", "has", "have", "he", "hence", "her", "here",
        "hereafter", "hereby", "herein", "hereupon", "hers", "herself", "him",
        "himself", "his", "how", "however", "hundred", "if", "in", "indeed",
        "interest", "into", "is", "it", "its", "itself", "keep", "last", "latter",
        "latterly", "least", "less", "made", "many", "may", "me", "meanwhile",
        "might", "mine", "more", "moreover", "most", "mostly", "move", "much",
        "must", "my", "myself", "name", "namely", "neither", "never",
        "nevertheless", "next", "nine", "no", "nobody", "none", "noone", "nor",
        "not", "nothing", "now", "nowhere", "of", "off", "often", "on", "once",
        "one", "only", "onto", "or", "other", "others", "otherwise", "our", "ours",
        "ourselves", "out", "over", "own", "part", "per", "perhaps", "please",
        "put", "rather", "re", "same", "see", "seem", "seemed", "seeming", "seems",
        "serious", "several", "she", "should", "show", "side", "since", "six",
        "sixty", "so", "some", "somehow", "someone", "something", "sometime",
        "sometimes", "somewhere", "still", "such", "system", "take", "ten", "than",
        "that", "the", "their", "them", "themselves", "then", "thence", "there",
        "thereafter", "thereby", "therefore", "therein", "thereupon", "these",
        "they", "third", "this", "those", "though", "three", "through",
        "throughout", "thru", "thus", "to", "together", "too", "top", "toward",
        "towards", "twelve", "twenty", "two", "under", "until", "up", "upon", "us",
        "very", "via", "was", "we", "well", "were", "what", "whatever", "when",
        "whence", "whenever", "where", "whereafter", "whereas", "whereby",
        "wherein", "whereupon", "wherever", "whether", "which", "while", "whither",
        "who", "whoever", "whole", "whom", "whose", "why", "will", "with",
        "within", "without", "would", "yet", "you", "your", "yours", "yourself",
        "yourselves",
    ]
    .iter()
    .copied()
    .collect()
}
