//! Object graph benchmarks
//!
//! Covers host value conversion, foreign copy of shared resources, page
//! list mutation and formatting of wide graphs.
//!
//! Run with: `cargo bench graph_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pdfgraph::formatter::format;
use pdfgraph::{CodecConfig, Dictionary, Document, HostValue, IndirectRef, Name};
use std::time::Duration;

fn host_array(len: usize) -> HostValue {
    HostValue::Seq(
        (0..len)
            .map(|i| {
                if i % 2 == 0 {
                    HostValue::Int(i as i128)
                } else {
                    HostValue::Float(i as f64 / 7.0)
                }
            })
            .collect(),
    )
}

fn document_with_pages(count: usize) -> (Document, Vec<IndirectRef>) {
    let mut doc = Document::new();
    let mut font = Dictionary::new();
    font.set("/Type", Name::new("/Font").unwrap()).unwrap();
    let font = doc.make_indirect(font).unwrap();

    let mut pages = Vec::with_capacity(count);
    for _ in 0..count {
        let page = doc.new_page([0.0, 0.0, 612.0, 792.0]).unwrap();
        let mut fonts = Dictionary::new();
        fonts.set("/F1", font).unwrap();
        let mut resources = Dictionary::new();
        resources.set("/Font", fonts).unwrap();
        doc.set_key(page, "/Resources", resources).unwrap();
        doc.pages().append(page).unwrap();
        pages.push(page);
    }
    (doc, pages)
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    let config = CodecConfig::default();
    for len in [16, 256, 4096] {
        let value = host_array(len);
        group.bench_with_input(BenchmarkId::new("array", len), &value, |b, value| {
            b.iter(|| pdfgraph::codec::encode(black_box(value.clone()), &config).unwrap())
        });
    }
    group.finish();
}

fn bench_foreign_copy(c: &mut Criterion) {
    let mut group = c.benchmark_group("foreign_copy");
    for count in [10, 100] {
        let (source, _) = document_with_pages(count);
        group.bench_with_input(BenchmarkId::new("pages", count), &source, |b, source| {
            b.iter(|| {
                let mut dest = Document::new();
                dest.pages().extend_from(black_box(source)).unwrap();
                dest
            })
        });
    }
    group.finish();
}

fn bench_page_reverse(c: &mut Criterion) {
    let (mut doc, _) = document_with_pages(200);
    c.bench_function("pages/reverse_200", |b| {
        b.iter(|| doc.pages().reverse().unwrap())
    });
}

fn bench_format(c: &mut Criterion) {
    let mut doc = Document::new();
    let value = doc.encode(host_array(1000)).unwrap();
    let array = doc.make_indirect(value).unwrap();
    doc.push_item(array, array).unwrap();
    c.bench_function("format/array_1000_with_cycle", |b| {
        b.iter(|| format(&doc, black_box(&array.into())).unwrap())
    });
}

criterion_group!(
    name = graph_benches;
    config = Criterion::default().measurement_time(Duration::from_secs(5));
    targets = bench_encode, bench_foreign_copy, bench_page_reverse, bench_format
);
criterion_main!(graph_benches);
