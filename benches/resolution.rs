//! Benchmarks for type and member resolution.
//!
//! Resolution is two-phased: a cold construction pass that classifies the host
//! type and renders its canonical name, and a cached pass that must stay cheap
//! because compiler passes resolve the same handful of types over and over.

extern crate xamlscope;

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::sync::Arc;
use xamlscope::host::{HostTypeBuilder, HostUniverse};
use xamlscope::schema::{MetadataProvider, XamlSchemaContext};

fn populated_universe() -> Arc<HostUniverse> {
    let universe = HostUniverse::new();
    let assembly = universe.register_assembly("App");
    for index in 0..64 {
        let name = format!("Widget{index}");
        let _ = HostTypeBuilder::new(&universe, &assembly, "App.Controls", &name)
            .property("Title", &universe.core().string)
            .dependency_property("Title")
            .default_ctor()
            .register();
    }
    let list = HostTypeBuilder::new(&universe, &assembly, "", "List`1").generic_params(&["T"]);
    let item = list.generic_param(0);
    let _ = list.collection_of(&item).register();
    universe
}

/// Benchmark cached name resolution, the hot path of every compiler pass.
fn bench_resolve_cached(c: &mut Criterion) {
    let universe = populated_universe();
    let provider = MetadataProvider::new(&XamlSchemaContext::new(&universe));
    provider
        .resolve_name("App.Controls.Widget0")
        .unwrap()
        .unwrap();

    c.bench_function("resolve_name_cached", |b| {
        b.iter(|| {
            let resolved = provider
                .resolve_name(black_box("App.Controls.Widget0"))
                .unwrap();
            black_box(resolved)
        });
    });
}

/// Benchmark cold descriptor construction across a fresh context each batch.
fn bench_resolve_cold(c: &mut Criterion) {
    let universe = populated_universe();

    c.bench_function("resolve_name_cold", |b| {
        b.iter(|| {
            let provider = MetadataProvider::new(&XamlSchemaContext::new(&universe));
            for index in 0..64 {
                let name = format!("App.Controls.Widget{index}");
                let resolved = provider.resolve_name(black_box(&name)).unwrap();
                black_box(resolved);
            }
        });
    });
}

/// Benchmark the generic-name construction grammar on a nested instantiation.
fn bench_generic_construction(c: &mut Criterion) {
    let universe = populated_universe();

    c.bench_function("resolve_generic_name", |b| {
        b.iter(|| {
            let provider = MetadataProvider::new(&XamlSchemaContext::new(&universe));
            let resolved = provider
                .resolve_name(black_box("List<List<Int32>>"))
                .unwrap();
            black_box(resolved)
        });
    });
}

/// Benchmark member discovery including the attachable convention scan.
fn bench_member_resolution(c: &mut Criterion) {
    let universe = populated_universe();
    let provider = MetadataProvider::new(&XamlSchemaContext::new(&universe));
    let widget = provider
        .resolve_name("App.Controls.Widget0")
        .unwrap()
        .unwrap();

    c.bench_function("get_member_cached", |b| {
        b.iter(|| {
            let member = widget.get_member(black_box("Title"));
            black_box(member)
        });
    });
}

criterion_group!(
    benches,
    bench_resolve_cached,
    bench_resolve_cold,
    bench_generic_construction,
    bench_member_resolution,
);
criterion_main!(benches);
