use criterion::{black_box, criterion_group, criterion_main, Criterion};

use expo64::IndexMapping;

pub fn benchmark_map_to_index(c: &mut Criterion) {
    for scale in [-4i32, 0, 8, 20] {
        let mapping = IndexMapping::new(scale).unwrap();
        c.bench_function(&format!("map-to-index-scale-{scale}"), |b| {
            let mut values = (1u64..).map(|v| v as f64 * 1.6180339887);
            b.iter(|| mapping.map_to_index(black_box(values.next().unwrap())))
        });
    }
    let mapping = IndexMapping::new(20).unwrap();
    c.bench_function("map-to-index-scale-20-subnormal", |b| {
        let mut values = (1u64..).map(|v| f64::from_bits(v % 0x000f_ffff_ffff_ffff + 1));
        b.iter(|| mapping.map_to_index(black_box(values.next().unwrap())))
    });
}

pub fn benchmark_lower_boundary(c: &mut Criterion) {
    for scale in [-4i32, 0, 8, 20] {
        let mapping = IndexMapping::new(scale).unwrap();
        let span = (mapping.max_index() as i64 - mapping.min_index() as i64) as u64;
        c.bench_function(&format!("lower-boundary-scale-{scale}"), |b| {
            let mut indices =
                (0u64..).map(|i| (mapping.min_index() as i64 + (i % span) as i64) as i32);
            b.iter(|| mapping.lower_boundary(black_box(indices.next().unwrap())))
        });
    }
}

criterion_group!(benches, benchmark_map_to_index, benchmark_lower_boundary);
criterion_main!(benches);
