use std::ops::Mul;
use std::simd::num::SimdFloat;
use std::simd::{f32x16, f32x4, f32x8};

/// Squared Euclidean distance between two equal-length f32 slices:
/// `sum((a[i] - b[i])^2)`. No `sqrt` — callers only need a ranking, and
/// skipping it saves a transcendental call per comparison.
///
/// Caller guarantees `a.len() == b.len()`; lengths are never checked here.
/// Below 32 elements the SIMD setup cost dominates, so a scalar loop is used
/// instead.
pub fn sq_l2_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() < 32 {
        return sq_l2_distance_scalar(a, b);
    }
    sq_l2_distance_simd(a, b)
}

fn sq_l2_distance_scalar(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn sq_l2_distance_simd(a: &[f32], b: &[f32]) -> f32 {
    let mut sum_16 = f32x16::splat(0.0);
    let mut sum_8 = f32x8::splat(0.0);
    let mut sum_4 = f32x4::splat(0.0);
    let mut sum_1 = 0.0;

    let mut a_vec = a;
    let mut b_vec = b;
    let mut a_len = a_vec.len();

    if a_len / 16 > 0 {
        a_vec
            .chunks_exact(16)
            .zip(b_vec.chunks_exact(16))
            .for_each(|(a, b)| {
                let a_slice = f32x16::from_slice(a);
                let b_slice = f32x16::from_slice(b);
                let diff = a_slice - b_slice;
                sum_16 += diff.mul(diff);
            });
        a_vec = a_vec.chunks_exact(16).remainder();
        b_vec = b_vec.chunks_exact(16).remainder();
        a_len %= 16;
    }

    if a_len / 8 > 0 {
        a_vec
            .chunks_exact(8)
            .zip(b_vec.chunks_exact(8))
            .for_each(|(a, b)| {
                let a_slice = f32x8::from_slice(a);
                let b_slice = f32x8::from_slice(b);
                let diff = a_slice - b_slice;
                sum_8 += diff.mul(diff);
            });
        a_vec = a_vec.chunks_exact(8).remainder();
        b_vec = b_vec.chunks_exact(8).remainder();
        a_len %= 8;
    }

    if a_len / 4 > 0 {
        a_vec
            .chunks_exact(4)
            .zip(b_vec.chunks_exact(4))
            .for_each(|(a, b)| {
                let a_slice = f32x4::from_slice(a);
                let b_slice = f32x4::from_slice(b);
                let diff = a_slice - b_slice;
                sum_4 += diff.mul(diff);
            });
        a_vec = a_vec.chunks_exact(4).remainder();
        b_vec = b_vec.chunks_exact(4).remainder();
        a_len %= 4;
    }

    for i in 0..a_len {
        sum_1 += (a_vec[i] - b_vec[i]) * (a_vec[i] - b_vec[i]);
    }

    sum_16.reduce_sum() + sum_8.reduce_sum() + sum_4.reduce_sum() + sum_1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::generate_random_vector;

    #[test]
    fn scalar_and_simd_agree() {
        let a = generate_random_vector(128);
        let b = generate_random_vector(128);
        let simd = sq_l2_distance_simd(&a, &b);
        let scalar = sq_l2_distance_scalar(&a, &b);
        assert!((simd - scalar).abs() < 1e-3);
    }

    #[test]
    fn dispatches_to_scalar_below_threshold() {
        let a = generate_random_vector(16);
        let b = generate_random_vector(16);
        let dispatched = sq_l2_distance(&a, &b);
        let scalar = sq_l2_distance_scalar(&a, &b);
        assert_eq!(dispatched, scalar);
    }

    #[test]
    fn zero_for_identical_vectors() {
        let a = generate_random_vector(64);
        assert_eq!(sq_l2_distance(&a, &a), 0.0);
    }

    #[test]
    fn matches_hand_computed_example() {
        let a = [1.0f32, 1.0];
        let b = [1.5f32, 2.0];
        // (1 - 1.5)^2 + (1 - 2)^2 = 0.25 + 1.0 = 1.25
        assert!((sq_l2_distance(&a, &b) - 1.25).abs() < 1e-6);
    }

    #[test]
    fn non_multiple_of_lane_width_handles_tail() {
        let a = generate_random_vector(37);
        let b = generate_random_vector(37);
        let simd = sq_l2_distance_simd(&a, &b);
        let scalar = sq_l2_distance_scalar(&a, &b);
        assert!((simd - scalar).abs() < 1e-2);
    }
}
