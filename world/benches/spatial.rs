use codec::EntityRef;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use world::{Aabb, QuadTree, SpatialIndex, UniformGrid};

const BOUND: f32 = 4_000.0;

fn scatter(count: usize) -> Vec<Aabb> {
    let mut rng = Pcg32::seed_from_u64(7);
    (0..count)
        .map(|_| {
            let radius = rng.random_range(10.0..80.0);
            Aabb::new(
                rng.random_range(-BOUND..BOUND),
                rng.random_range(-BOUND..BOUND),
                radius,
                radius,
            )
        })
        .collect()
}

fn strategies() -> Vec<(&'static str, Box<dyn SpatialIndex>)> {
    vec![
        ("grid", Box::new(UniformGrid::new(7))),
        ("quad_tree", Box::new(QuadTree::new(5, 10))),
    ]
}

fn fill(index: &mut dyn SpatialIndex, items: &[Aabb]) {
    index.reset(BOUND, BOUND);
    for (id, bounds) in items.iter().enumerate() {
        index.insert_entity(EntityRef::new(id as u32, 1), *bounds);
    }
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("spatial_insert");
    for count in [500, 2_000, 8_000] {
        let items = scatter(count);
        for (name, mut index) in strategies() {
            group.bench_with_input(BenchmarkId::new(name, count), &items, |b, items| {
                b.iter(|| fill(index.as_mut(), black_box(items)));
            });
        }
    }
    group.finish();
}

fn bench_viewport_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("spatial_viewport_query");
    let viewport = Aabb::new(0.0, 0.0, 960.0, 540.0);
    for count in [500, 2_000, 8_000] {
        let items = scatter(count);
        for (name, mut index) in strategies() {
            fill(index.as_mut(), &items);
            group.bench_function(BenchmarkId::new(name, count), |b| {
                b.iter(|| index.retrieve(black_box(viewport), &|_| true));
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_insert, bench_viewport_query);
criterion_main!(benches);
