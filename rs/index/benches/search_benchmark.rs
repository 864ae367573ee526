use criterion::{black_box, criterion_group, criterion_main, Criterion};
use index::{Config, Index, OffHeapVectorStore, VectorStore};
use utils::test_utils::generate_clustered_vectors;

fn build_benchmark_index() -> Index {
    let rows = generate_clustered_vectors(20_000, 32, 50, 0.05);
    let mut store = OffHeapVectorStore::new(32, rows.len());
    for (i, row) in rows.iter().enumerate() {
        store.add_vector(i as u32, row).unwrap();
    }
    let config = Config::default();
    Index::build(&store, 141, &config).unwrap()
}

fn bench_search(c: &mut Criterion) {
    let index = build_benchmark_index();
    let query = generate_clustered_vectors(1, 32, 50, 0.05).remove(0);
    c.bench_function("ivf_search_k10", |bencher| {
        bencher.iter(|| index.search(black_box(&query), 10, 0.05).unwrap())
    });
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
