use std::path::Path;

use anyhow::Result;
use log::info;

use crate::config::Config;
use crate::error::IndexError;
use crate::int_list::IntList;
use crate::ivf::builder::IvfBuilder;
use crate::ivf::io::IndexIo;
use crate::ivf::query::QueryEngine;
use crate::kmeans::KMeansTrainer;
use crate::sampler::ReservoirSampler;
use crate::vector_store::{OffHeapVectorStore, VectorStore};

/// Human-readable cluster-balance summary, spec §6's `stats()`.
#[derive(Debug, Clone)]
pub struct IndexStats {
    pub num_clusters: usize,
    pub num_vectors: usize,
    pub empty_clusters: usize,
    pub min_cluster_size: usize,
    pub max_cluster_size: usize,
    pub avg_cluster_size: f64,
}

impl std::fmt::Display for IndexStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "clusters={} vectors={} empty_clusters={} min={} max={} avg={:.2}",
            self.num_clusters,
            self.num_vectors,
            self.empty_clusters,
            self.min_cluster_size,
            self.max_cluster_size,
            self.avg_cluster_size
        )
    }
}

/// Top-level facade over the IVF build/search/persist lifecycle, spec §6.
/// Centroids and vectors are always materialized off-heap internally since
/// that is the layout `IndexIo` persists; `Config::storage_kind` governs
/// only the variant the caller is expected to use while assembling the
/// input `VectorStore` passed to `build`.
pub struct Index {
    centroids: OffHeapVectorStore,
    postings: Vec<IntList>,
    vectors: OffHeapVectorStore,
}

impl Index {
    /// Builds an index over `vectors` with `k` clusters, per the spec's
    /// build dataflow: sample → train k-means → assign full dataset.
    pub fn build(vectors: &dyn VectorStore, k: usize, config: &Config) -> Result<Self> {
        if k == 0 {
            anyhow::bail!(IndexError::CapacityExceeded {
                detail: "k must be at least 1".to_string(),
            });
        }
        let n = vectors.len();
        if k > n {
            anyhow::bail!(IndexError::CapacityExceeded {
                detail: format!("k ({}) cannot exceed the number of vectors ({})", k, n),
            });
        }

        let dim = vectors.dim();
        let sample_size = config.sample_size(n).max(k);

        let mut sampler = ReservoirSampler::new(config.seed);
        let sample_ids = sampler.sample(n, sample_size);
        info!(
            "sampled {} of {} vectors for k-means training",
            sample_ids.size(),
            n
        );

        let trainer = KMeansTrainer::new(k, dim, config.kmeans_iters, config.seed);
        let centroids = trainer.fit(&sample_ids, vectors)?;

        let builder = IvfBuilder::new(k);
        let postings = builder.build(vectors, &centroids)?;

        let mut owned_vectors = OffHeapVectorStore::new(dim, n);
        for i in 0..n {
            let row = vectors.get_vector(i as u32)?;
            owned_vectors.add_vector(i as u32, &row)?;
        }

        info!("build complete: k={} n={} dim={}", k, n, dim);

        Ok(Self {
            centroids,
            postings,
            vectors: owned_vectors,
        })
    }

    /// `search(q, K)`, spec §4.7 / §6.
    pub fn search(&self, query: &[f32], k: usize, probe_fraction: f64) -> Result<Vec<u32>> {
        let engine = QueryEngine::new(&self.centroids, &self.postings, &self.vectors);
        engine.search(query, k, probe_fraction)
    }

    pub fn write(&self, base_name: impl AsRef<Path>) -> Result<()> {
        IndexIo::write(base_name, &self.centroids, &self.postings, &self.vectors)
    }

    pub fn read(base_name: impl AsRef<Path>) -> Result<Self> {
        let (centroids, postings, vectors) = IndexIo::read(base_name)?;
        if centroids.len() == 0 {
            anyhow::bail!(IndexError::NotBuilt);
        }
        Ok(Self {
            centroids,
            postings,
            vectors,
        })
    }

    pub fn stats(&self) -> IndexStats {
        let sizes: Vec<usize> = self.postings.iter().map(|p| p.size()).collect();
        let empty_clusters = sizes.iter().filter(|&&s| s == 0).count();
        let min_cluster_size = sizes.iter().copied().min().unwrap_or(0);
        let max_cluster_size = sizes.iter().copied().max().unwrap_or(0);
        let total: usize = sizes.iter().sum();
        let avg_cluster_size = if sizes.is_empty() {
            0.0
        } else {
            total as f64 / sizes.len() as f64
        };

        IndexStats {
            num_clusters: self.postings.len(),
            num_vectors: self.vectors.len(),
            empty_clusters,
            min_cluster_size,
            max_cluster_size,
            avg_cluster_size,
        }
    }
}
