//! Brute-force cosine top-k over one tag's vectors.
//!
//! The scan walks the whole `nodeVectors` table, keeps rows whose key
//! carries the requested tag and whose payload has the tag's registered
//! length, and maintains a size-k min-heap so the pass is O(n log k).
//! Accumulation runs in f64; the returned score is the f32 narrowing.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::codec;
use crate::error::StoreError;
use crate::keys;
use crate::model::{KnnHit, NodeId, SymbolId};
use crate::store::Store;

/// Heap entry ordered so the *lowest* score sits at the top of the
/// (max-)heap, making eviction of the weakest hit a `peek`/`pop`.
struct MinScored(f32, NodeId);

impl PartialEq for MinScored {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for MinScored {}

impl PartialOrd for MinScored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MinScored {
    fn cmp(&self, other: &Self) -> Ordering {
        // reversed so the heap yields the minimum score first
        other.0.partial_cmp(&self.0).unwrap_or(Ordering::Equal)
    }
}

/// Cosine similarity `(q·v) / (‖q‖·‖v‖)` with f64 accumulators.
/// By convention a zero-norm operand scores 0.
fn cosine(query: &[f32], query_norm: f64, v: &[f32]) -> f32 {
    let mut dot = 0.0f64;
    let mut norm_v = 0.0f64;
    for (a, b) in query.iter().zip(v.iter()) {
        let (a, b) = (*a as f64, *b as f64);
        dot += a * b;
        norm_v += b * b;
    }
    let norm_v = norm_v.sqrt();
    if norm_v == 0.0 {
        return 0.0;
    }
    (dot / (query_norm * norm_v)) as f32
}

impl Store {
    /// The `k` nodes whose `tag_id` vector is most cosine-similar to
    /// `query`, in descending score order.
    ///
    /// Returns empty when `k` is zero or the tag has no registered
    /// dimension yet. The query length must be `4 × dim` for the tag.
    pub fn knn(
        &self,
        tag_id: SymbolId,
        query: &[u8],
        k: usize,
    ) -> Result<Vec<KnnHit>, StoreError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let rtxn = self.env.read_txn()?;
        let Some(dim) = self.env.vec_tag_meta.get(&rtxn, &keys::symbol_key(tag_id))? else {
            return Ok(Vec::new());
        };
        let expected_len = dim as usize * 4;
        if query.len() != expected_len {
            return Err(StoreError::InvalidArgument(format!(
                "query is {} bytes but tag dimension {dim} requires {expected_len}",
                query.len()
            )));
        }

        let query = codec::bytes_to_floats(query)?;
        let mut query_norm = query.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();
        if query_norm == 0.0 {
            // degenerate query: every score collapses to 0
            query_norm = 1.0;
        }

        let mut heap: BinaryHeap<MinScored> = BinaryHeap::with_capacity(k + 1);
        for row in self.env.node_vectors.iter(&rtxn)? {
            let (key, value) = row?;
            let (node_id, row_tag) = keys::split_sub_key(key)?;
            if row_tag != tag_id || value.len() != expected_len {
                continue;
            }
            let v = codec::bytes_to_floats(value)?;
            let score = cosine(&query, query_norm, &v);

            if heap.len() < k {
                heap.push(MinScored(score, node_id));
            } else if let Some(weakest) = heap.peek() {
                if score > weakest.0 {
                    heap.pop();
                    heap.push(MinScored(score, node_id));
                }
            }
        }

        let mut hits: Vec<KnnHit> = heap
            .into_iter()
            .map(|MinScored(score, node_id)| KnnHit { node_id, score })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewNode;
    use tempfile::TempDir;

    fn open_store() -> (Store, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        (store, dir)
    }

    fn node_with_vector(store: &Store, tag: SymbolId, coords: &[f32]) -> NodeId {
        let id = store.create_node(NewNode::default()).unwrap().id;
        store
            .upsert_vector(id, tag, 0, &codec::floats_to_bytes(coords))
            .unwrap();
        id
    }

    #[test]
    fn top_k_descending_scores() {
        let (store, _dir) = open_store();
        let tag = 1;
        let v1 = node_with_vector(&store, tag, &[1.0, 0.0, 0.0, 0.0]);
        let v2 = node_with_vector(&store, tag, &[0.0, 1.0, 0.0, 0.0]);
        let v3 = node_with_vector(&store, tag, &[0.7071, 0.7071, 0.0, 0.0]);
        let v4 = node_with_vector(&store, tag, &[0.5, 0.5, 0.5, 0.5]);
        let v5 = node_with_vector(&store, tag, &[-1.0, 0.0, 0.0, 0.0]);

        let query = codec::floats_to_bytes(&[1.0, 0.0, 0.0, 0.0]);
        let hits = store.knn(tag, &query, 5).unwrap();

        let ids: Vec<NodeId> = hits.iter().map(|h| h.node_id).collect();
        assert_eq!(ids, vec![v1, v3, v4, v2, v5]);

        let expected = [1.0f32, 0.7071, 0.5, 0.0, -1.0];
        for (hit, want) in hits.iter().zip(expected) {
            assert!(
                (hit.score - want).abs() < 1e-4,
                "score {} != {want}",
                hit.score
            );
        }
    }

    #[test]
    fn k_larger_than_population_returns_all() {
        let (store, _dir) = open_store();
        node_with_vector(&store, 1, &[1.0, 0.0]);
        node_with_vector(&store, 1, &[0.0, 1.0]);
        let hits = store
            .knn(1, &codec::floats_to_bytes(&[1.0, 0.0]), 10)
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn zero_norm_query_scores_everything_zero() {
        let (store, _dir) = open_store();
        for _ in 0..3 {
            node_with_vector(&store, 1, &[1.0, 2.0, 3.0, 4.0]);
        }
        let hits = store
            .knn(1, &codec::floats_to_bytes(&[0.0; 4]), 3)
            .unwrap();
        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|h| h.score == 0.0));
    }

    #[test]
    fn zero_norm_stored_vector_scores_zero() {
        let (store, _dir) = open_store();
        let zero = node_with_vector(&store, 1, &[0.0, 0.0]);
        let hits = store
            .knn(1, &codec::floats_to_bytes(&[1.0, 0.0]), 5)
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].node_id, zero);
        assert_eq!(hits[0].score, 0.0);
    }

    #[test]
    fn k_zero_and_unknown_tag_return_empty() {
        let (store, _dir) = open_store();
        node_with_vector(&store, 1, &[1.0]);
        assert!(store.knn(1, &codec::floats_to_bytes(&[1.0]), 0).unwrap().is_empty());
        assert!(store.knn(77, &[], 5).unwrap().is_empty());
    }

    #[test]
    fn wrong_length_query_is_invalid() {
        let (store, _dir) = open_store();
        node_with_vector(&store, 1, &[0.0; 8]);
        let err = store.knn(1, &[0u8; 20], 5).unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
    }

    #[test]
    fn other_tags_do_not_leak_into_results() {
        let (store, _dir) = open_store();
        let in_tag = node_with_vector(&store, 1, &[1.0, 0.0]);
        // same dimension, different tag
        node_with_vector(&store, 2, &[1.0, 0.0]);
        let hits = store.knn(1, &codec::floats_to_bytes(&[1.0, 0.0]), 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].node_id, in_tag);
    }
}
