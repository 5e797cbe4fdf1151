//! Benchmarks for noredux-core
//!
//! Run with: cargo bench

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use noredux_core::atom::{Atom, Registry};
use noredux_core::{create_store, lens, make_model, Partial, Signal};

// =============================================================================
// SIGNAL BENCHMARKS
// =============================================================================

fn bench_signal_set(c: &mut Criterion) {
    let s = Signal::new(0i32);
    let mut next = 0;
    c.bench_function("signal_set", |b| {
        b.iter(|| {
            next += 1;
            s.set(black_box(next))
        })
    });
}

fn bench_signal_set_same_value(c: &mut Criterion) {
    let s = Signal::new(42i32);
    c.bench_function("signal_set_same_value", |b| b.iter(|| s.set(black_box(42))));
}

fn bench_signal_listeners(c: &mut Criterion) {
    let mut group = c.benchmark_group("signal_listeners");

    for count in [1, 10, 100] {
        group.bench_with_input(BenchmarkId::new("notify", count), &count, |b, &count| {
            let s = Signal::new(0i32);
            let _subs: Vec<_> = (0..count)
                .map(|_| s.listen(|v| {
                    black_box(*v);
                }))
                .collect();
            let mut next = 0;

            b.iter(|| {
                next += 1;
                s.set(next)
            })
        });
    }

    group.finish();
}

// =============================================================================
// ATOM BENCHMARKS
// =============================================================================

fn bench_computed_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("computed_chain");

    for depth in [1, 5, 10, 20] {
        group.bench_with_input(BenchmarkId::new("depth", depth), &depth, |b, &depth| {
            let source = Atom::value(1i32);
            let mut current = {
                let source = source.clone();
                Atom::computed(move |query| Ok(query.value(&source)? + 1))
            };
            for _ in 1..depth {
                let prev = current.clone();
                current = Atom::computed(move |query| Ok(query.value(&prev)? + 1));
            }

            let registry = Registry::new();
            let tail = registry.get(&current).unwrap();
            let set = registry.get(&source).unwrap().actions();
            let mut next = 1;

            b.iter(|| {
                next += 1;
                set.set(next);
                black_box(tail.get())
            })
        });
    }

    group.finish();
}

fn bench_atom_lookup(c: &mut Criterion) {
    let atom = Atom::value(0i32);
    let registry = Registry::new();
    let query = registry.query();
    query.get(&atom).unwrap();

    c.bench_function("atom_lookup", |b| b.iter(|| black_box(query.value(&atom).unwrap())));
}

// =============================================================================
// STORE BENCHMARKS
// =============================================================================

#[derive(Clone)]
struct Form {
    title: String,
    count: u64,
    tags: Arc<Vec<String>>,
}

fn bench_provider_patch(c: &mut Criterion) {
    let model = make_model(
        Form {
            title: "form".into(),
            count: 0,
            tags: Arc::new(vec!["a".into(); 16]),
        },
        |store| store,
    );
    let provider = create_store(model).mount().unwrap();
    let store = provider.actions();
    let mut next = 0;

    c.bench_function("provider_patch", |b| {
        b.iter(|| {
            next += 1;
            store.patch(Partial::new().with(lens!(Form, count), next));
        })
    });

    c.bench_function("provider_patch_same_value", |b| {
        let title = store.get().title.clone();
        b.iter(|| {
            store.patch(Partial::new().with(lens!(Form, title), title.clone()));
        })
    });

    black_box(store.get().tags.len());
}

// =============================================================================
// CRITERION SETUP
// =============================================================================

criterion_group!(
    signal_benches,
    bench_signal_set,
    bench_signal_set_same_value,
    bench_signal_listeners,
);

criterion_group!(atom_benches, bench_computed_chain, bench_atom_lookup);

criterion_group!(store_benches, bench_provider_patch);

criterion_main!(signal_benches, atom_benches, store_benches);
