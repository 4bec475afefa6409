use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use search_batcher::application::batching::{DocumentBatchIterator, SpooledBuilderProvider};
use search_batcher::application::ports::SpoolProvider;
use search_batcher::domain::entities::{Document, SerializedDocument};
use search_batcher::domain::value_objects::BatchLimits;
use search_batcher::infrastructure::spool::{AdaptiveSpoolProvider, SpoolStrategy};
use std::hint::black_box;
use std::sync::Arc;
use tempfile::TempDir;

fn documents(count: usize, field_bytes: usize) -> Vec<SerializedDocument> {
    (0..count)
        .map(|i| {
            let document = Document::add(format!("doc-{}", i))
                .with_version(1)
                .with_field("title", format!("Title {}", i))
                .with_field("body", "lorem ipsum ".repeat(field_bytes / 12));
            SerializedDocument::from_document(&document).unwrap()
        })
        .collect()
}

fn pack_all(documents: Vec<SerializedDocument>, spools: Arc<dyn SpoolProvider>) -> u64 {
    let builders = Arc::new(SpooledBuilderProvider::new(BatchLimits::default(), spools));
    let mut total = 0;
    for batch in DocumentBatchIterator::from_serialized(documents, builders) {
        let batch = batch.unwrap();
        total += batch.size_bytes();
        batch.close().unwrap();
    }
    total
}

fn packing_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("packing");
    let spool_dir = TempDir::new().unwrap();

    for field_bytes in [256usize, 4 * 1024, 64 * 1024] {
        let input = documents(2_000, field_bytes);
        let input_bytes: u64 = input.iter().map(|d| d.size_bytes()).sum();
        group.throughput(Throughput::Bytes(input_bytes));

        let memory: Arc<dyn SpoolProvider> = Arc::new(AdaptiveSpoolProvider::new(
            SpoolStrategy::Memory,
            BatchLimits::DEFAULT_MAX_BATCH_SIZE,
            0,
            None,
        ));
        group.bench_with_input(BenchmarkId::new("memory", field_bytes), &input, |b, input| {
            b.iter(|| black_box(pack_all(input.clone(), Arc::clone(&memory))))
        });

        let file: Arc<dyn SpoolProvider> = Arc::new(AdaptiveSpoolProvider::new(
            SpoolStrategy::File,
            BatchLimits::DEFAULT_MAX_BATCH_SIZE,
            0,
            Some(spool_dir.path().to_path_buf()),
        ));
        group.bench_with_input(BenchmarkId::new("file", field_bytes), &input, |b, input| {
            b.iter(|| black_box(pack_all(input.clone(), Arc::clone(&file))))
        });
    }

    group.finish();
}

fn serialization_benchmarks(c: &mut Criterion) {
    let document = Document::add("doc-1")
        .with_version(1)
        .with_field("title", "A title with \u{0001}control characters\u{FFFF}")
        .with_field("body", "lorem ipsum ".repeat(1_000));

    c.bench_function("serialize_document", |b| {
        b.iter(|| black_box(SerializedDocument::from_document(black_box(&document)).unwrap()))
    });
}

criterion_group!(benches, packing_benchmarks, serialization_benchmarks);
criterion_main!(benches);
