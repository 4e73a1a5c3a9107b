use anyhow::Result;
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use filings_core::traits::Embedder;
use filings_text::tokenize;

/// Deterministic bag-of-tokens embedding. No model files needed; texts that
/// share tokens land near each other, which is enough for tests and dev runs.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for token in tokenize(text) {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let sign = if (h >> 63) == 0 { 1.0 } else { -1.0 };
            v[idx] += sign * (0.5 + (((h >> 32) as u32) as f32) / (u32::MAX as f32));
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v { *x /= norm; }
        } else {
            v[0] = 1.0;
        }
        v
    }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

    #[test]
    fn unit_length_and_deterministic() {
        let e = HashEmbedder::new(64);
        let a = e.embed("Revenue increased 15%").unwrap();
        let b = e.embed("revenue INCREASED 15").unwrap();
        assert_eq!(a.len(), 64);
        assert!((dot(&a, &a) - 1.0).abs() < 1e-4);
        assert!((dot(&a, &b) - 1.0).abs() < 1e-4, "same tokens give the same vector");
    }

    #[test]
    fn empty_text_is_still_unit() {
        let v = HashEmbedder::new(8).embed("").unwrap();
        assert!((dot(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn shared_tokens_are_closer() {
        let e = HashEmbedder::new(256);
        let q = e.embed("cybersecurity threats").unwrap();
        let near = e.embed("cybersecurity threats could disrupt operations").unwrap();
        let far = e.embed("net income rose to record levels").unwrap();
        assert!(dot(&q, &near) > dot(&q, &far));
    }
}
