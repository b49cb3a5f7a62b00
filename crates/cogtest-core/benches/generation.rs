use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use cogtest_core::generator::generate_with_rng;
use cogtest_core::model::TestType;

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");

    for test_type in TestType::ALL {
        group.bench_function(format!("{test_type} x20"), |b| {
            let mut rng = StdRng::seed_from_u64(42);
            b.iter(|| generate_with_rng(black_box(test_type), black_box(20), &mut rng))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_generate);
criterion_main!(benches);
