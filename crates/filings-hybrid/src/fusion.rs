//! Reciprocal Rank Fusion.
//!
//! RRF(d) = Σ 1 / (k + rank(d)) over every ranking that contains d, with
//! 1-based ranks. Rankings that omit d contribute nothing.

use std::collections::HashMap;
use tracing::debug;

use filings_core::ChunkId;

/// Fused `(id, score)` pairs, highest score first. Equal scores keep the
/// order in which ids were first seen across the rankings.
pub fn fused_scores(rankings: &[Vec<ChunkId>], k: u32) -> Vec<(ChunkId, f64)> {
    let mut order: Vec<(ChunkId, f64)> = Vec::new();
    let mut slot: HashMap<&str, usize> = HashMap::new();

    for ranking in rankings {
        for (rank, id) in ranking.iter().enumerate() {
            let contribution = 1.0 / (f64::from(k) + rank as f64 + 1.0);
            match slot.get(id.as_str()) {
                Some(&i) => order[i].1 += contribution,
                None => {
                    slot.insert(id.as_str(), order.len());
                    order.push((id.clone(), contribution));
                }
            }
        }
    }

    order.sort_by(|a, b| b.1.total_cmp(&a.1));
    debug!(rankings = rankings.len(), fused = order.len(), k, "rrf fusion");
    order
}

pub fn reciprocal_rank_fusion(rankings: &[Vec<ChunkId>], k: u32) -> Vec<ChunkId> {
    fused_scores(rankings, k).into_iter().map(|(id, _)| id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(xs: &[&str]) -> Vec<ChunkId> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(reciprocal_rank_fusion(&[], 60).is_empty());
        assert!(reciprocal_rank_fusion(&[vec![], vec![]], 60).is_empty());
    }

    #[test]
    fn single_ranking_is_unchanged() {
        let r = ids(&["c4", "c1", "c9", "c2"]);
        assert_eq!(reciprocal_rank_fusion(&[r.clone()], 60), r);
    }

    #[test]
    fn shared_documents_rise() {
        let fused = reciprocal_rank_fusion(&[ids(&["c1", "c2", "c3"]), ids(&["c3", "c1", "c4"])], 60);
        // c1: 1/61 + 1/62, c3: 1/63 + 1/61, c2: 1/62, c4: 1/63
        assert_eq!(fused, ids(&["c1", "c3", "c2", "c4"]));
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let fused = reciprocal_rank_fusion(&[ids(&["a", "b"]), ids(&["a", "c"])], 60);
        assert_eq!(fused, ids(&["a", "b", "c"]));
    }

    #[test]
    fn scores_are_sorted_and_ids_unique() {
        let scored = fused_scores(&[ids(&["x", "y", "z", "w"]), ids(&["w", "q", "x"]), ids(&["q"])], 1);
        assert!(scored.windows(2).all(|w| w[0].1 >= w[1].1));
        let mut seen: Vec<&str> = scored.iter().map(|(id, _)| id.as_str()).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), scored.len());
        let x = scored.iter().find(|(id, _)| id == "x").map(|(_, s)| *s).unwrap();
        assert!((x - (1.0 / 2.0 + 1.0 / 4.0)).abs() < 1e-12);
    }
}
