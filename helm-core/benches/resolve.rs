//! Resolver benchmarks.
//!
//! Resolution runs on every store revision, so its cost bounds how cheaply
//! a page full of components can mount.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use helm_core::ssr::render_ssr_head;
use helm_core::store::props;
use helm_core::{HeadInput, HeadStore, TagInput};

fn populated_store(entries: usize) -> HeadStore {
    let store = HeadStore::new();
    for i in 0..entries {
        store.push(HeadInput {
            title: Some(format!("Page {i}")),
            meta: vec![
                TagInput::from_props(props([
                    ("name", "description".to_string()),
                    ("content", format!("description {i}")),
                ])),
                TagInput::from_props(props([
                    ("property", "og:title".to_string()),
                    ("content", format!("Page {i}")),
                ])),
            ],
            link: vec![TagInput::from_props(props([
                ("rel", "preconnect".to_string()),
                ("href", format!("https://cdn{i}.example.com")),
            ]))],
            html_attrs: props([("lang", "en")]),
            ..Default::default()
        });
    }
    store
}

fn bench_resolve(c: &mut Criterion) {
    let store = populated_store(50);
    c.bench_function("resolve 50 entries", |b| {
        // Push/dispose to defeat the revision memo and measure a full pass.
        b.iter(|| {
            let handle = store.push(HeadInput::titled("bench"));
            let head = store.resolve();
            handle.dispose();
            black_box(head)
        })
    });
}

fn bench_ssr(c: &mut Criterion) {
    let store = populated_store(50);
    c.bench_function("render ssr head", |b| b.iter(|| black_box(render_ssr_head(&store))));
}

criterion_group!(benches, bench_resolve, bench_ssr);
criterion_main!(benches);
