use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use sg_datagen::settings::SystematicSpec;
use sg_datagen::{DataGenerator, PartitionConfig, benchmark_settings, partition};
use std::hint::black_box;

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_benchmark_case");
    for n in [1_000usize, 10_000, 100_000] {
        let mut settings = benchmark_settings(1, n, 0.5, 1.0);
        settings.seed = Some(42);
        group.bench_with_input(BenchmarkId::new("translation", n), &settings, |b, s| {
            b.iter(|| {
                let mut g = DataGenerator::new(s.clone()).unwrap();
                black_box(g.generate_data().unwrap().original.len())
            })
        });
    }
    group.finish();
}

fn bench_all_systematics(c: &mut Criterion) {
    let mut settings = benchmark_settings(1, 10_000, 0.5, 1.0);
    settings.seed = Some(42);
    settings.systematics = Some(vec![
        SystematicSpec::Rotation { rotation_degree: 15.0 },
        SystematicSpec::Translation { z_magnitude: 1.0, alpha: 90.0 },
        SystematicSpec::Scaling { scaling_factor: 1.2 },
        SystematicSpec::Box { box_l: 4.0 },
    ]);
    settings.apply_copula = true;
    settings.alpha = Some(2.0);
    settings.beta = Some(1.0);

    c.bench_function("generate_all_systematics_10k", |b| {
        b.iter(|| {
            let mut g = DataGenerator::new(black_box(settings.clone())).unwrap();
            black_box(g.generate_data().unwrap().biased.len())
        })
    });
}

fn bench_partition(c: &mut Criterion) {
    let mut settings = benchmark_settings(1, 100_000, 0.5, 1.0);
    settings.seed = Some(7);
    let mut g = DataGenerator::new(settings).unwrap();
    let frame = g.generate_data().unwrap().original.clone();
    let config = PartitionConfig::default();

    c.bench_function("partition_100k", |b| {
        b.iter(|| black_box(partition(black_box(&frame), &config).unwrap().test_folds.len()))
    });
}

criterion_group!(benches, bench_generate, bench_all_systematics, bench_partition);
criterion_main!(benches);
