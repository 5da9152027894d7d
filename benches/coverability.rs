//! Benchmarks for the order checks and a small backward search.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gtscover::prelude::*;

fn cycle(len: usize) -> Hypergraph {
    let mut g = Hypergraph::new();
    let vs = g.add_vertices(len);
    for i in 0..len {
        g.add_edge("E", vec![vs[i], vs[(i + 1) % len]]).unwrap();
    }
    g
}

fn path(len: usize) -> Hypergraph {
    let mut g = Hypergraph::new();
    let vs = g.add_vertices(len + 1);
    for w in vs.windows(2) {
        g.add_edge("E", vec![w[0], w[1]]).unwrap();
    }
    g
}

/// Isomorphism on a rotated 64-cycle, where refinement cannot split vertices.
fn bench_isomorphism_cycle_64(c: &mut Criterion) {
    let g = cycle(64);
    let mut h = Hypergraph::new();
    let vs = h.add_vertices(64);
    for i in 0..64 {
        h.add_edge("E", vec![vs[(i + 7) % 64], vs[(i + 8) % 64]]).unwrap();
    }

    c.bench_function("isomorphism_cycle_64", |b| {
        b.iter(|| assert!(are_isomorphic(black_box(&g), black_box(&h))));
    });
}

/// Minor check of a triangle against a 6-cycle (contract three edges).
fn bench_minor_triangle_in_cycle(c: &mut Criterion) {
    let small = cycle(3);
    let big = cycle(6);

    c.bench_function("minor_triangle_in_cycle_6", |b| {
        b.iter(|| assert!(MinorOrder.is_less_or_eq(black_box(&small), black_box(&big))));
    });
    c.bench_function("path_minor_triangle_in_cycle_6", |b| {
        b.iter(|| assert!(PathMinorOrder.is_less_or_eq(black_box(&small), black_box(&big))));
    });
}

/// Full backward search: pendant-edge growth against a 4-edge path.
fn bench_backward_pendant_path(c: &mut Criterion) {
    let mut left = Hypergraph::new();
    let v = left.add_vertex();
    let mut right = Hypergraph::new();
    let rv = right.add_vertex();
    let w = right.add_vertex();
    right.add_edge("E", vec![rv, w]).unwrap();
    let rule = Rule::new("grow", left, right).preserve_vertex(v, rv);

    c.bench_function("backward_pendant_path_4", |b| {
        b.iter(|| {
            let mut gts = Gts::new("grow");
            gts.add_rule(rule.clone()).unwrap();
            let mut analysis = BackwardAnalysis::builder()
                .gts(gts)
                .error_graphs([path(4)])
                .with_default_collaborators()
                .build()
                .unwrap();
            let outcome = analysis.perform_analysis().unwrap();
            black_box(outcome.antichain.len())
        });
    });
}

criterion_group!(
    benches,
    bench_isomorphism_cycle_64,
    bench_minor_triangle_in_cycle,
    bench_backward_pendant_path
);
criterion_main!(benches);
