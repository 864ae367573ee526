use rand::Rng;

/// Generates a vector of `dimension` uniform-random f32s in `[0, 1)`.
pub fn generate_random_vector(dimension: usize) -> Vec<f32> {
    let mut rng = rand::thread_rng();
    (0..dimension).map(|_| rng.gen::<f32>()).collect()
}

/// Generates `count` vectors clustered tightly around `num_centers` random
/// means, for recall/k-means tests that need data with actual structure.
pub fn generate_clustered_vectors(
    count: usize,
    dimension: usize,
    num_centers: usize,
    spread: f32,
) -> Vec<Vec<f32>> {
    let mut rng = rand::thread_rng();
    let centers: Vec<Vec<f32>> = (0..num_centers)
        .map(|_| generate_random_vector(dimension))
        .collect();
    (0..count)
        .map(|i| {
            let center = &centers[i % num_centers];
            center
                .iter()
                .map(|c| c + rng.gen_range(-spread..spread))
                .collect()
        })
        .collect()
}
