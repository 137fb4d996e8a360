use criterion::{
    criterion_group, criterion_main, AxisScale, BenchmarkId, Criterion, PlotConfiguration,
    Throughput,
};
use rand::{Rng, SeedableRng};
use rand_distr::Normal;

use mirror_tree::*;

/// Points scattered around a few centers, mirrored across x = 0
fn clustered(rng: &mut impl Rng, count: usize) -> Vec<Point3> {
    let spread = Normal::new(0.0, 0.05).unwrap();
    let centers = (0..8)
        .map(|_| [(); 3].map(|()| rng.gen_range(0.0..10.0)))
        .collect::<Vec<Point3>>();
    let mut points = Vec::with_capacity(count);
    while points.len() + 1 < count {
        let center = centers[rng.gen_range(0..centers.len())];
        let p = center.map(|x| x + rng.sample(spread));
        points.push(p);
        points.push([-p[0], p[1], p[2]]);
    }
    points
}

pub fn bench(c: &mut Criterion) {
    let mut rng = rand::rngs::SmallRng::from_seed([0xAB; 32]);

    let points = (0..10_000)
        .map(|_| [(); 3].map(|()| rng.gen_range(-1_000.0..1_000.0)))
        .collect::<Vec<Point3>>();
    let ids = (0..points.len() as u32).collect::<Vec<_>>();
    c.bench_function("build over 10000 points", |b| {
        b.iter(|| KdTree::from_points(&points, &ids).unwrap());
    });

    let tree = KdTree::from_points(&points, &ids).unwrap();
    c.bench_function("nearest of 1000 queries", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                let query = [(); 3].map(|()| rng.gen_range(-1_000.0..1_000.0));
                tree.nearest(&query);
            }
        });
    });

    let mut group = c.benchmark_group("mirror search over clustered points");
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));
    for count in [100, 1_000, 10_000, 100_000] {
        let index = MirrorIndex::new(Geometry::mesh(clustered(&mut rng, count)).unwrap()).unwrap();
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &index, |b, index| {
            b.iter(|| {
                index.mirror_search(
                    &Reflection::object(Axis::X),
                    DEFAULT_THRESHOLD,
                    MatchPolicy::Permissive,
                )
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench);
criterion_main!(benches);
