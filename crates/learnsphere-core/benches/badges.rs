use criterion::{black_box, criterion_group, criterion_main, Criterion};

use learnsphere_core::badges::{Badge, BadgeTable};

fn bench_current_badge(c: &mut Criterion) {
    let mut group = c.benchmark_group("current_badge");

    let standard = BadgeTable::standard();
    group.bench_function("standard", |b| {
        b.iter(|| standard.current_badge(black_box(75)))
    });

    let wide = BadgeTable::new(
        (0..1000)
            .map(|i| Badge::new(format!("Tier {i}"), i * 10, ""))
            .collect(),
    )
    .expect("non-empty table");
    group.bench_function("tiers=1000", |b| {
        b.iter(|| wide.current_badge(black_box(5_005)))
    });

    group.bench_function("badges_between,tiers=1000", |b| {
        b.iter(|| wide.badges_between(black_box(100), black_box(9_000)).len())
    });

    group.finish();
}

criterion_group!(benches, bench_current_badge);
criterion_main!(benches);
