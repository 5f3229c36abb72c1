//! Criterion microbenches for hubtrail's per-record work.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure the performance of:
//! - property normalization of a hub model record (normalize_properties)
//! - flattening a catalog page into a table (CatalogTable::from_records)

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use hubtrail::catalog::CatalogTable;
use hubtrail::normalize::normalize_properties;
use hubtrail::record::CatalogRecord;

// Trimmed model record in the shape the hub returns for /api/models/<id>
const MODEL_FIXTURE: &str = r#"{
    "_id": "621ffdc036468d709f174338",
    "id": "camembert-base",
    "modelId": "camembert-base",
    "author": "Équipe \"ALMAnaCH\"",
    "sha": "3f452b6e5a89b0e6c828c9bba2642bc577086eae",
    "downloads": 1234567,
    "likes": 42,
    "pipeline_tag": "fill-mask",
    "tags": ["transformers", "pytorch", "camembert", "fill-mask", "fr", "license:mit"],
    "cardData": {
        "language": "fr",
        "license": "mit",
        "datasets": ["oscar"],
        "widget": [{"text": "Le camembert est <mask> :)"}]
    },
    "siblings": [
        {"rfilename": "config.json"},
        {"rfilename": "pytorch_model.bin"},
        {"rfilename": "sentencepiece.bpe.model"}
    ]
}"#;

fn fixture() -> CatalogRecord {
    CatalogRecord::from_json_slice(MODEL_FIXTURE.as_bytes()).unwrap()
}

/// Benchmark normalizing every field of a model record.
fn bench_normalize_record(c: &mut Criterion) {
    let record = fixture();
    let mut group = c.benchmark_group("normalize");
    group.throughput(Throughput::Bytes(MODEL_FIXTURE.len() as u64));

    group.bench_function("normalize_properties", |b| {
        b.iter(|| black_box(normalize_properties(black_box(&record))))
    });

    group.finish();
}

/// Benchmark flattening a page of catalog rows.
fn bench_catalog_table(c: &mut Criterion) {
    let page: Vec<CatalogRecord> = (0..100).map(|_| fixture()).collect();
    let mut group = c.benchmark_group("catalog");
    group.throughput(Throughput::Elements(page.len() as u64));

    group.bench_function("table_from_records", |b| {
        b.iter(|| black_box(CatalogTable::from_records(black_box(&page))))
    });

    group.finish();
}

criterion_group!(benches, bench_normalize_record, bench_catalog_table);
criterion_main!(benches);
