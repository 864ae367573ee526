use anyhow::Result;
use log::debug;
use rand::rngs::StdRng;
use rand::seq::index::sample as sample_indices;
use rand::SeedableRng;

use utils::distance::sq_l2_distance;

use crate::int_list::IntList;
use crate::vector_store::{OffHeapVectorStore, VectorStore};

/// Lloyd's-algorithm trainer over a sampled subset (spec §4.5). Produces
/// `k` centroids; the labels it computes along the way are discarded once
/// training converges — `IvfBuilder` redoes the assignment over the full
/// dataset.
pub struct KMeansTrainer {
    k: usize,
    dim: usize,
    max_iter: usize,
    seed: u64,
}

impl KMeansTrainer {
    pub fn new(k: usize, dim: usize, max_iter: usize, seed: u64) -> Self {
        Self {
            k,
            dim,
            max_iter,
            seed,
        }
    }

    /// Trains on the rows named by `sample_ids` within `vectors`. Returns the
    /// centroid matrix as a fresh off-heap store of `k` rows.
    pub fn fit(
        &self,
        sample_ids: &IntList,
        vectors: &dyn VectorStore,
    ) -> Result<OffHeapVectorStore> {
        let sample: Vec<u32> = sample_ids.iter().map(|&id| id as u32).collect();
        let mut centroids = self.init_centroids(&sample, vectors)?;
        let mut labels = vec![usize::MAX; sample.len()];

        for iter in 0..self.max_iter {
            let new_labels = self.assign(&sample, vectors, &centroids);
            let changed = new_labels != labels;
            labels = new_labels;
            self.update(&sample, vectors, &labels, &mut centroids)?;
            debug!("kmeans iteration {} complete, changed={}", iter, changed);
            if !changed {
                break;
            }
        }

        Ok(centroids)
    }

    /// Picks `k` distinct positions uniformly at random from `sample_ids`,
    /// seeded so init is reproducible across builds.
    fn init_centroids(
        &self,
        sample: &[u32],
        vectors: &dyn VectorStore,
    ) -> Result<OffHeapVectorStore> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let chosen = sample_indices(&mut rng, sample.len(), self.k);

        let mut centroids = OffHeapVectorStore::new(self.dim, self.k);
        for (c, idx) in chosen.iter().enumerate() {
            let row = vectors.get_segment(sample[idx])?;
            centroids.add_vector(c as u32, row)?;
        }
        Ok(centroids)
    }

    /// Assign step, spec §4.5.2: strict `<` improves, no swap on exact tie,
    /// so the previously assigned centroid wins ties.
    fn assign(
        &self,
        sample: &[u32],
        vectors: &dyn VectorStore,
        centroids: &OffHeapVectorStore,
    ) -> Vec<usize> {
        sample
            .iter()
            .map(|&id| {
                let v = vectors.get_segment(id).expect("sample id in range");
                let mut best = 0usize;
                let mut best_dist = f32::INFINITY;
                for c in 0..self.k {
                    let centroid = centroids.get_segment(c as u32).expect("centroid in range");
                    let d = sq_l2_distance(v, centroid);
                    if d < best_dist {
                        best_dist = d;
                        best = c;
                    }
                }
                best
            })
            .collect()
    }

    /// Update step, spec §4.5.3: recompute each centroid as the mean of its
    /// assigned sample points; empty clusters reset to the zero vector.
    fn update(
        &self,
        sample: &[u32],
        vectors: &dyn VectorStore,
        labels: &[usize],
        centroids: &mut OffHeapVectorStore,
    ) -> Result<()> {
        let mut sums = vec![0.0f32; self.k * self.dim];
        let mut counts = vec![0u32; self.k];

        for (&id, &label) in sample.iter().zip(labels.iter()) {
            let v = vectors.get_segment(id)?;
            let offset = label * self.dim;
            for d in 0..self.dim {
                sums[offset + d] += v[d];
            }
            counts[label] += 1;
        }

        for c in 0..self.k {
            let offset = c * self.dim;
            let mut row = vec![0.0f32; self.dim];
            if counts[c] > 0 {
                let n = counts[c] as f32;
                for d in 0..self.dim {
                    row[d] = sums[offset + d] / n;
                }
            }
            centroids.add_vector(c as u32, &row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::ReservoirSampler;

    fn store_from_rows(rows: &[Vec<f32>]) -> OffHeapVectorStore {
        let dim = rows[0].len();
        let mut store = OffHeapVectorStore::new(dim, rows.len());
        for (i, row) in rows.iter().enumerate() {
            store.add_vector(i as u32, row).unwrap();
        }
        store
    }

    #[test]
    fn converges_on_well_separated_clusters() {
        let rows = vec![
            vec![0.0, 0.0],
            vec![0.1, -0.1],
            vec![-0.1, 0.1],
            vec![10.0, 10.0],
            vec![10.1, 9.9],
            vec![9.9, 10.1],
        ];
        let store = store_from_rows(&rows);
        let sample_ids: IntList = (0..rows.len() as i32).collect();
        let trainer = KMeansTrainer::new(2, 2, 300, 1);
        let centroids = trainer.fit(&sample_ids, &store).unwrap();
        assert_eq!(centroids.len(), 2);

        let c0 = centroids.get_segment(0).unwrap().to_vec();
        let c1 = centroids.get_segment(1).unwrap().to_vec();
        let near_origin = |c: &[f32]| c[0].abs() < 1.0 && c[1].abs() < 1.0;
        let near_ten = |c: &[f32]| (c[0] - 10.0).abs() < 1.0 && (c[1] - 10.0).abs() < 1.0;
        assert!(
            (near_origin(&c0) && near_ten(&c1)) || (near_origin(&c1) && near_ten(&c0)),
            "centroids should settle near the two planted means"
        );
    }

    #[test]
    fn tolerates_sample_smaller_than_k_positions_requested() {
        let rows: Vec<Vec<f32>> = (0..20)
            .map(|i| vec![i as f32, (i * 2) as f32])
            .collect();
        let store = store_from_rows(&rows);
        let mut sampler = ReservoirSampler::new(3);
        let sample_ids = sampler.sample(rows.len(), 10);
        let trainer = KMeansTrainer::new(4, 2, 50, 3);
        let centroids = trainer.fit(&sample_ids, &store).unwrap();
        assert_eq!(centroids.len(), 4);
    }

    #[test]
    fn same_seed_converges_to_identical_centroids() {
        let rows = vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![9.0, 9.0],
            vec![8.0, 9.0],
            vec![9.0, 8.0],
        ];
        let store = store_from_rows(&rows);
        let sample_ids: IntList = (0..rows.len() as i32).collect();
        let a = KMeansTrainer::new(2, 2, 300, 77).fit(&sample_ids, &store).unwrap();
        let b = KMeansTrainer::new(2, 2, 300, 77).fit(&sample_ids, &store).unwrap();
        assert_eq!(a.as_slice(), b.as_slice());
    }
}
