use criterion::{criterion_group, criterion_main};

mod fit;
use fit::{bench_change_point_fit, bench_pipeline};

criterion_group!(benches_fit, bench_change_point_fit, bench_pipeline);
criterion_main!(benches_fit);
