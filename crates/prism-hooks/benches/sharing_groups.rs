use criterion::{criterion_group, criterion_main, Criterion};
use prism_hooks::{NativeContext, SharingGroups};
use std::hint::black_box;

fn bench_root_resolution(c: &mut Criterion) {
    // 1,000 groups of 16 contexts, each created sharing with the previous one
    let mut groups = SharingGroups::new();
    for group in 0..1_000usize {
        let base = group * 16;
        groups.insert(NativeContext(base));
        for member in 1..16 {
            groups.union(NativeContext(base + member - 1), NativeContext(base + member));
        }
    }
    // Punch holes so some chains run through dead links
    for group in (0..1_000usize).step_by(3) {
        groups.remove(NativeContext(group * 16 + 7));
    }

    let mut group = c.benchmark_group("Sharing Groups");

    group.bench_function("Resolve root (chain tails)", |b| {
        b.iter(|| {
            for g in 0..1_000usize {
                black_box(groups.resolve_root(NativeContext(g * 16 + 15)));
            }
        });
    });

    group.bench_function("Union then resolve (fresh forest)", |b| {
        b.iter(|| {
            let mut fresh = SharingGroups::new();
            for i in 1..256usize {
                fresh.union(NativeContext(i - 1), NativeContext(i));
            }
            black_box(fresh.resolve_root(NativeContext(255)));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_root_resolution);
criterion_main!(benches);
