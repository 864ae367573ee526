use std::cmp::Ordering;
use std::collections::BinaryHeap;

use anyhow::Result;
use log::info;

use utils::distance::sq_l2_distance;

use crate::error::IndexError;
use crate::int_list::IntList;
use crate::vector_store::VectorStore;

/// One candidate in a bounded max-heap: a squared distance paired with the
/// id it was computed for. Ordered by distance only, per spec §4.7 (ties
/// among equal distances are broken by heap arrival order, never by id).
#[derive(Debug, Clone, Copy)]
struct Scored {
    dist: f32,
    id: u32,
}

impl PartialEq for Scored {
    fn eq(&self, other: &Self) -> bool {
        self.dist == other.dist
    }
}
impl Eq for Scored {}

impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scored {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist.total_cmp(&other.dist)
    }
}

/// Pushes `incoming` onto a max-heap bounded at `cap`, per the shared
/// insertion rule used at both query stages: push while under capacity;
/// once full, replace the current max only on strict improvement (no swap
/// on an exact tie).
fn push_bounded(heap: &mut BinaryHeap<Scored>, incoming: Scored, cap: usize) {
    if heap.len() < cap {
        heap.push(incoming);
    } else if let Some(top) = heap.peek() {
        if incoming.dist < top.dist {
            heap.pop();
            heap.push(incoming);
        }
    }
}

/// Drains a max-heap into a `Vec` ordered by ascending distance, writing
/// from the back as the spec's drain step describes.
fn drain_ascending(mut heap: BinaryHeap<Scored>) -> Vec<Scored> {
    let mut out = vec![Scored { dist: 0.0, id: 0 }; heap.len()];
    for slot in out.iter_mut().rev() {
        *slot = heap.pop().expect("heap length matches allocated slots");
    }
    out
}

/// Two-stage top-K search, spec §4.7: probe the `P` nearest centroids, then
/// scan their posting lists for the `K` nearest vectors. Grounded on the
/// teacher's `search_with_centroids` bounded-heap loop; unlike the teacher,
/// both stages here use the identical bounded-heap insertion rule so their
/// tie/determinism behavior matches exactly.
pub struct QueryEngine<'a> {
    centroids: &'a dyn VectorStore,
    postings: &'a [IntList],
    vectors: &'a dyn VectorStore,
}

impl<'a> QueryEngine<'a> {
    pub fn new(
        centroids: &'a dyn VectorStore,
        postings: &'a [IntList],
        vectors: &'a dyn VectorStore,
    ) -> Self {
        Self {
            centroids,
            postings,
            vectors,
        }
    }

    /// `P = max(1, floor(probe_fraction * k))`, per spec §4.7. Delegates to
    /// `Config::num_probes` so the two query-time stages and the config
    /// layer share one formula.
    pub fn num_probes(&self, probe_fraction: f64) -> usize {
        crate::config::Config::num_probes(probe_fraction, self.centroids.len())
    }

    fn nearest_centroids(&self, query: &[f32], num_probes: usize) -> Result<Vec<usize>> {
        let k = self.centroids.len();
        let mut heap: BinaryHeap<Scored> = BinaryHeap::with_capacity(num_probes);
        for c in 0..k {
            let centroid = self.centroids.get_segment(c as u32)?;
            let dist = sq_l2_distance(query, centroid);
            push_bounded(
                &mut heap,
                Scored {
                    dist,
                    id: c as u32,
                },
                num_probes,
            );
        }
        Ok(drain_ascending(heap).into_iter().map(|s| s.id as usize).collect())
    }

    fn scan_posting_lists(
        &self,
        query: &[f32],
        centroid_ids: &[usize],
        k: usize,
    ) -> Result<Vec<Scored>> {
        let mut heap: BinaryHeap<Scored> = BinaryHeap::with_capacity(k);
        for &c in centroid_ids {
            let posting = &self.postings[c];
            for &vid in posting.iter() {
                if vid < 0 {
                    continue;
                }
                let v = self.vectors.get_segment(vid as u32)?;
                let dist = sq_l2_distance(query, v);
                push_bounded(
                    &mut heap,
                    Scored {
                        dist,
                        id: vid as u32,
                    },
                    k,
                );
            }
        }
        Ok(drain_ascending(heap))
    }

    /// Returns up to `k` ids ordered by ascending squared distance to
    /// `query`. `dim` mismatches are rejected before any scan starts.
    pub fn search(&self, query: &[f32], k: usize, probe_fraction: f64) -> Result<Vec<u32>> {
        if query.len() != self.centroids.dim() {
            anyhow::bail!(IndexError::DimensionMismatch {
                expected: self.centroids.dim(),
                actual: query.len(),
            });
        }

        let num_probes = self.num_probes(probe_fraction);
        let centroid_ids = self.nearest_centroids(query, num_probes)?;
        let results = self.scan_posting_lists(query, &centroid_ids, k)?;
        info!(
            "search probed {} clusters, returned {} of requested {} results",
            centroid_ids.len(),
            results.len(),
            k
        );
        Ok(results.into_iter().map(|s| s.id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::OffHeapVectorStore;

    fn store(rows: &[Vec<f32>]) -> OffHeapVectorStore {
        let dim = rows[0].len();
        let mut s = OffHeapVectorStore::new(dim, rows.len());
        for (i, row) in rows.iter().enumerate() {
            s.add_vector(i as u32, row).unwrap();
        }
        s
    }

    #[test]
    fn tiny_ann_sanity_scenario() {
        let vectors = store(&[
            vec![1.0, 1.0],
            vec![1.5, 2.0],
            vec![3.0, 4.0],
            vec![5.0, 7.0],
            vec![3.5, 5.0],
            vec![4.5, 5.0],
            vec![3.5, 4.5],
        ]);
        let centroids = store(&[vec![1.25, 1.5], vec![4.0, 5.5]]);
        let postings = vec![
            vec![0i32, 1].into_iter().collect(),
            vec![2i32, 3, 4, 5, 6].into_iter().collect(),
        ];
        let engine = QueryEngine::new(&centroids, &postings, &vectors);
        let results = engine.search(&[1.2, 1.5], 2, 1.0).unwrap();
        assert_eq!(results, vec![0, 1]);
    }

    #[test]
    fn returns_fewer_than_k_when_probed_lists_are_short() {
        let vectors = store(&[vec![0.0, 0.0], vec![1.0, 0.0]]);
        let centroids = store(&[vec![0.0, 0.0], vec![100.0, 100.0]]);
        let postings = vec![
            vec![0i32, 1].into_iter().collect(),
            IntList::new(),
        ];
        let engine = QueryEngine::new(&centroids, &postings, &vectors);
        let results = engine.search(&[0.0, 0.0], 5, 0.5).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn results_are_sorted_by_ascending_distance() {
        let vectors = store(&[
            vec![0.0, 0.0],
            vec![5.0, 0.0],
            vec![1.0, 0.0],
            vec![3.0, 0.0],
        ]);
        let centroids = store(&[vec![0.0, 0.0]]);
        let postings = vec![vec![0i32, 1, 2, 3].into_iter().collect()];
        let engine = QueryEngine::new(&centroids, &postings, &vectors);
        let results = engine.search(&[0.0, 0.0], 4, 1.0).unwrap();
        assert_eq!(results, vec![0, 2, 3, 1]);
    }

    #[test]
    fn rejects_dimension_mismatch() {
        let vectors = store(&[vec![0.0, 0.0]]);
        let centroids = store(&[vec![0.0, 0.0]]);
        let postings = vec![IntList::new()];
        let engine = QueryEngine::new(&centroids, &postings, &vectors);
        assert!(engine.search(&[0.0, 0.0, 0.0], 1, 1.0).is_err());
    }
}
