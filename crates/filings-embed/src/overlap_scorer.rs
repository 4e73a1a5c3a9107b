use anyhow::Result;
use std::collections::{HashMap, HashSet};

use filings_core::traits::RelevanceScorer;
use filings_text::tokenize;

/// Lexical stand-in for the cross-encoder: share of distinct query tokens found
/// in the passage, with a small log-frequency bonus to separate ties.
#[derive(Debug, Clone, Copy, Default)]
pub struct TermOverlapScorer;

impl TermOverlapScorer {
    fn score(query_tokens: &HashSet<String>, text: &str) -> f32 {
        if query_tokens.is_empty() {
            return 0.0;
        }
        let mut tf: HashMap<String, u32> = HashMap::new();
        for t in tokenize(text) {
            *tf.entry(t).or_insert(0) += 1;
        }
        let mut matched = 0usize;
        let mut bonus = 0.0f32;
        for q in query_tokens {
            if let Some(&n) = tf.get(q) {
                matched += 1;
                bonus += (1.0 + n as f32).ln();
            }
        }
        matched as f32 / query_tokens.len() as f32 + 0.01 * bonus
    }
}

impl RelevanceScorer for TermOverlapScorer {
    fn score_pairs(&self, query: &str, texts: &[&str]) -> Result<Vec<f32>> {
        let query_tokens: HashSet<String> = tokenize(query).into_iter().collect();
        Ok(texts.iter().map(|t| Self::score(&query_tokens, t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn more_overlap_scores_higher() {
        let s = TermOverlapScorer.score_pairs("cloud revenue growth", &["cloud revenue grew", "cloud revenue growth", "lease terms"]).unwrap();
        assert!(s[1] > s[0]);
        assert!(s[0] > s[2]);
        assert_eq!(s[2], 0.0);
    }

    #[test]
    fn one_score_per_text() {
        assert!(TermOverlapScorer.score_pairs("q", &[]).unwrap().is_empty());
        assert_eq!(TermOverlapScorer.score_pairs("", &["a b", "cc"]).unwrap(), vec![0.0, 0.0]);
    }
}
