use anyhow::Result;
use log::info;

use utils::distance::sq_l2_distance;

use crate::int_list::IntList;
use crate::vector_store::VectorStore;

/// Full-dataset assignment phase, spec §4.6. Generalizes the centroid-probe
/// loop shape to "assign every vector to its single nearest centroid",
/// using the `≤` tie rule: on an exact distance tie, the later centroid in
/// iteration order wins, unlike `KMeansTrainer::assign`'s strict `<`.
pub struct IvfBuilder {
    k: usize,
}

impl IvfBuilder {
    pub fn new(k: usize) -> Self {
        Self { k }
    }

    /// Scans all `N` vectors against all `k` centroids and returns the `k`
    /// posting lists. `postings[c]` holds exactly the ids assigned to
    /// centroid `c`; the sets are pairwise disjoint and their union is
    /// `{0,...,N-1}` (P1).
    pub fn build(
        &self,
        vectors: &dyn VectorStore,
        centroids: &dyn VectorStore,
    ) -> Result<Vec<IntList>> {
        let n = vectors.len();
        let mut postings: Vec<IntList> = (0..self.k).map(|_| IntList::new()).collect();

        for i in 0..n {
            let v = vectors.get_segment(i as u32)?;
            let mut best = 0usize;
            let mut best_dist = f32::INFINITY;
            for c in 0..self.k {
                let centroid = centroids.get_segment(c as u32)?;
                let d = sq_l2_distance(v, centroid);
                if d <= best_dist {
                    best_dist = d;
                    best = c;
                }
            }
            postings[best].add(i as i32);
        }

        info!(
            "ivf build assigned {} vectors across {} clusters",
            n, self.k
        );
        Ok(postings)
    }
}
