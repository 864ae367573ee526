use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Selects the `VectorStore` variant used for both the dataset and the
/// centroid matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageKind {
    OnHeap,
    OffHeap,
}

impl Default for StorageKind {
    fn default() -> Self {
        StorageKind::OffHeap
    }
}

/// Hyperparameters for one `Index::build` / `Index::search` lifecycle
/// (spec §4.9). All fields have defaults matching the spec's table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage_kind: StorageKind,
    pub kmeans_iters: usize,
    pub sample_fraction: f64,
    pub probe_fraction: f64,
    pub seed: u64,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_kind: StorageKind::OffHeap,
            kmeans_iters: 300,
            sample_fraction: 0.10,
            probe_fraction: 0.01,
            seed: 0x5EED_CAFE_u64,
            debug: false,
        }
    }
}

impl Config {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("failed to open config file {}", path.display()))?;
        let config: Config = serde_yaml::from_reader(file)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("failed to create config file {}", path.display()))?;
        serde_yaml::to_writer(file, self)
            .with_context(|| format!("failed to write config file {}", path.display()))?;
        Ok(())
    }

    pub fn sample_size(&self, n: usize) -> usize {
        ((self.sample_fraction * n as f64).floor() as usize).min(n)
    }

    /// `P = max(1, floor(probe_fraction * k))`, spec §4.7. A free function
    /// of `probe_fraction` and `k` rather than a `&self` method, so
    /// `QueryEngine` (which is handed a probe fraction per call, not a
    /// whole `Config`) can share this exact formula instead of
    /// reimplementing it.
    pub fn num_probes(probe_fraction: f64, k: usize) -> usize {
        ((probe_fraction * k as f64).floor() as usize).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let config = Config::default();
        assert_eq!(config.storage_kind, StorageKind::OffHeap);
        assert_eq!(config.kmeans_iters, 300);
        assert!((config.sample_fraction - 0.10).abs() < f64::EPSILON);
        assert!((config.probe_fraction - 0.01).abs() < f64::EPSILON);
        assert!(!config.debug);
    }

    #[test]
    fn sample_size_floors_and_clamps() {
        let config = Config {
            sample_fraction: 0.1,
            ..Config::default()
        };
        assert_eq!(config.sample_size(999), 99);
        assert_eq!(config.sample_size(5), 0);
    }

    #[test]
    fn num_probes_is_at_least_one() {
        assert_eq!(Config::num_probes(0.01, 10), 1);
        assert_eq!(Config::num_probes(0.01, 1000), 10);
    }

    #[test]
    fn round_trips_through_yaml() {
        let dir = tempdir::TempDir::new("config_test").unwrap();
        let path = dir.path().join("config.yaml");
        let config = Config {
            seed: 42,
            debug: true,
            ..Config::default()
        };
        config.to_yaml_file(&path).unwrap();
        let read_back = Config::from_yaml_file(&path).unwrap();
        assert_eq!(read_back.seed, 42);
        assert!(read_back.debug);
    }
}
