use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::int_list::IntList;

/// Uniform-without-replacement sampler (Algorithm R, spec §4.4). Streams
/// over `0..n` once, keeping a reservoir of exactly `m` ids (or fewer, if
/// `n < m`), seeded for reproducible sample selection across builds.
pub struct ReservoirSampler {
    rng: StdRng,
}

impl ReservoirSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Samples `m` ids from `0..n` without replacement. Returns all of
    /// `0..n` (in order) if `n <= m`.
    pub fn sample(&mut self, n: usize, m: usize) -> IntList {
        if n <= m {
            return (0..n as i32).collect();
        }

        let mut reservoir: Vec<i32> = (0..m as i32).collect();
        for i in m..n {
            let j = self.rng.gen_range(0..=i);
            if j < m {
                reservoir[j] = i as i32;
            }
        }
        reservoir.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_everything_when_n_below_m() {
        let mut sampler = ReservoirSampler::new(1);
        let sample = sampler.sample(5, 10);
        assert_eq!(sample.size(), 5);
        assert_eq!(sample.as_slice(), &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn returns_exactly_m_ids_within_range() {
        let mut sampler = ReservoirSampler::new(7);
        let sample = sampler.sample(1000, 50);
        assert_eq!(sample.size(), 50);
        for &id in sample.iter() {
            assert!((0..1000).contains(&id));
        }
    }

    #[test]
    fn sample_ids_are_unique() {
        let mut sampler = ReservoirSampler::new(11);
        let sample = sampler.sample(200, 40);
        let mut seen: Vec<i32> = sample.iter().copied().collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 40);
    }

    #[test]
    fn same_seed_gives_same_sample() {
        let mut a = ReservoirSampler::new(42);
        let mut b = ReservoirSampler::new(42);
        assert_eq!(a.sample(500, 30).as_slice(), b.sample(500, 30).as_slice());
    }

    #[test]
    fn different_seeds_usually_differ() {
        let mut a = ReservoirSampler::new(1);
        let mut b = ReservoirSampler::new(2);
        assert_ne!(a.sample(500, 30).as_slice(), b.sample(500, 30).as_slice());
    }
}
