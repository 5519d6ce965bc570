//! Benchmark for comparison and deep-copy throughput.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use specular_core::{deep_clone, is_equal, DiffReport};

#[derive(Default)]
struct Leaf {
    id: u64,
    label: String,
}

specular_core::structural!(Leaf { id, label });

#[derive(Default)]
struct Tree {
    name: String,
    leaves: Vec<Leaf>,
    annotation: Option<String>,
}

specular_core::structural!(Tree { name, leaves, annotation });

fn make_tree(leaves: usize) -> Tree {
    Tree {
        name: "bench".to_string(),
        leaves: (0..leaves)
            .map(|i| Leaf {
                id: i as u64,
                label: format!("leaf-{}", i),
            })
            .collect(),
        annotation: Some("steady".to_string()),
    }
}

fn bench_compare_equal(c: &mut Criterion) {
    let a = make_tree(100);
    let b = make_tree(100);

    c.bench_function("compare_equal_100_leaves", |bencher| {
        bencher.iter(|| is_equal(black_box(&a), black_box(&b)))
    });
}

fn bench_compare_with_differences(c: &mut Criterion) {
    let a = make_tree(100);
    let mut b = make_tree(100);
    for leaf in b.leaves.iter_mut().step_by(10) {
        leaf.label = "changed".to_string();
    }

    c.bench_function("compare_diff_100_leaves", |bencher| {
        bencher.iter(|| {
            let mut report = DiffReport::new();
            specular_core::compare(black_box(&a), black_box(&b), &mut report);
            black_box(report.len())
        })
    });
}

fn bench_deep_clone(c: &mut Criterion) {
    let tree = make_tree(100);

    c.bench_function("deep_clone_100_leaves", |bencher| {
        bencher.iter(|| deep_clone(black_box(&tree)).expect("bench tree clones"))
    });
}

criterion_group!(
    benches,
    bench_compare_equal,
    bench_compare_with_differences,
    bench_deep_clone
);
criterion_main!(benches);
