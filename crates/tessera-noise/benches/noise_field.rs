use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use tessera_noise::{NoiseParams, generate};

fn bench_noise_field(c: &mut Criterion) {
    let plain = NoiseParams::default().with_seed(1337);
    c.bench_function("noise_field_64x64", |b| {
        b.iter(|| black_box(generate(64, 64, black_box(&plain))))
    });

    let caves = NoiseParams::default()
        .with_seed(1337)
        .normalized()
        .with_split(0.55)
        .with_connectivity(2);
    c.bench_function("noise_field_64x64_connected", |b| {
        b.iter(|| black_box(generate(64, 64, black_box(&caves))))
    });
}

criterion_group!(benches, bench_noise_field);
criterion_main!(benches);
