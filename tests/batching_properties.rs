//! Property-based tests for batch packing
//!
//! Random document sizes and limits are packed through the real iterator and
//! memory spools; the packing invariants must hold for every input.


use proptest::prelude::*;
use std::sync::Arc;

use search_batcher::application::batching::{DocumentBatchIterator, SpooledBuilderProvider};
use search_batcher::domain::value_objects::{BatchLimits, LimitBoundary, FRAMING_OVERHEAD};
use search_batcher::infrastructure::spool::{AdaptiveSpoolProvider, SpoolStrategy};
use test_fixtures::{read_batch_blocking, sized_documents, TrackingSpoolProvider};

struct Packed {
    batches: Vec<(Vec<String>, u64, Vec<u8>)>,
    oversized: Vec<String>,
}

fn pack(sizes: &[usize], limits: BatchLimits, spools: &TrackingSpoolProvider) -> Packed {
    let builders = Arc::new(SpooledBuilderProvider::new(limits, Arc::new(spools.clone())));
    let mut iter = DocumentBatchIterator::from_serialized(sized_documents(sizes), builders);

    let mut batches = Vec::new();
    while iter.has_next().unwrap() {
        let batch = iter.next_batch().unwrap();
        let body = read_batch_blocking(&batch);
        batches.push((batch.document_ids().to_vec(), batch.size_bytes(), body));
        batch.close().unwrap();
    }
    let oversized = iter.documents_exceeding_single_size_limit().unwrap().to_vec();
    Packed { batches, oversized }
}

fn memory_spools(max_batch_size: u64) -> TrackingSpoolProvider {
    TrackingSpoolProvider::new(Arc::new(AdaptiveSpoolProvider::new(
        SpoolStrategy::Memory,
        max_batch_size,
        0,
        None,
    )))
}

/// (max_single_document_size, max_batch_size) with a consistent relation
fn limits_strategy() -> impl Strategy<Value = (u64, u64)> {
    (1u64..64).prop_flat_map(|single| {
        (Just(single), single + FRAMING_OVERHEAD..single * 4 + FRAMING_OVERHEAD + 1)
    })
}

fn boundary_strategy() -> impl Strategy<Value = LimitBoundary> {
    prop_oneof![Just(LimitBoundary::AllowEqual), Just(LimitBoundary::RejectEqual)]
}

proptest! {
    /// Every document ends up in exactly one batch or in the oversized list, in order
    #[test]
    fn documents_are_partitioned_in_order(
        (single, max) in limits_strategy(),
        boundary in boundary_strategy(),
        sizes in prop::collection::vec(1usize..96, 0..40),
    ) {
        let limits = BatchLimits::with_boundary(single, max, boundary).unwrap();
        let spools = memory_spools(max);
        let packed = pack(&sizes, limits, &spools);

        let expected_batched: Vec<String> = sizes
            .iter()
            .enumerate()
            .filter(|(_, size)| !limits.is_oversized(**size as u64))
            .map(|(i, _)| format!("doc-{}", i))
            .collect();
        let expected_oversized: Vec<String> = sizes
            .iter()
            .enumerate()
            .filter(|(_, size)| limits.is_oversized(**size as u64))
            .map(|(i, _)| format!("doc-{}", i))
            .collect();

        let batched: Vec<String> = packed
            .batches
            .iter()
            .flat_map(|(ids, _, _)| ids.iter().cloned())
            .collect();
        prop_assert_eq!(batched, expected_batched);
        prop_assert_eq!(packed.oversized, expected_oversized);
    }

    /// No batch exceeds the limit, none is empty, and the declared size is the body size
    #[test]
    fn batches_respect_size_bound(
        (single, max) in limits_strategy(),
        sizes in prop::collection::vec(1usize..96, 0..40),
    ) {
        let limits = BatchLimits::new(single, max).unwrap();
        let spools = memory_spools(max);
        let packed = pack(&sizes, limits, &spools);

        for (ids, size_bytes, body) in &packed.batches {
            prop_assert!(!ids.is_empty());
            prop_assert!(*size_bytes <= max, "batch of {} bytes over limit {}", size_bytes, max);
            prop_assert_eq!(*size_bytes, body.len() as u64);

            let parsed: Vec<serde_json::Value> = serde_json::from_slice(body).unwrap();
            prop_assert_eq!(parsed.len(), ids.len());
        }
    }

    /// A batch is only closed when the next document could not have joined it
    #[test]
    fn packing_is_greedy(
        (single, max) in limits_strategy(),
        sizes in prop::collection::vec(1usize..64, 1..40),
    ) {
        let limits = BatchLimits::new(single, max).unwrap();
        let spools = memory_spools(max);
        let packed = pack(&sizes, limits, &spools);

        let size_of = |id: &str| -> u64 {
            let index: usize = id.trim_start_matches("doc-").parse().unwrap();
            sizes[index] as u64
        };
        for pair in packed.batches.windows(2) {
            let (_, closed_size, _) = &pair[0];
            let (next_ids, _, _) = &pair[1];
            let first_next = size_of(&next_ids[0]);
            // delimiter + document would have pushed the closed batch over
            prop_assert!(closed_size + 1 + first_next > max);
        }
    }

    /// Every spool handed out is released once all batches are closed
    #[test]
    fn every_spool_is_released(
        (single, max) in limits_strategy(),
        sizes in prop::collection::vec(1usize..96, 0..40),
    ) {
        let limits = BatchLimits::new(single, max).unwrap();
        let spools = memory_spools(max);
        let packed = pack(&sizes, limits, &spools);

        prop_assert_eq!(spools.created(), packed.batches.len());
        prop_assert_eq!(spools.outstanding(), 0);
    }
}

#[test]
fn document_exactly_at_limit_depends_on_boundary() {
    let sizes = [10, 3];

    let allow = BatchLimits::with_boundary(10, 12, LimitBoundary::AllowEqual).unwrap();
    let packed = pack(&sizes, allow, &memory_spools(12));
    assert!(packed.oversized.is_empty());
    assert_eq!(packed.batches.len(), 2);
    assert_eq!(packed.batches[0].1, 12);

    let reject = BatchLimits::with_boundary(10, 12, LimitBoundary::RejectEqual).unwrap();
    let packed = pack(&sizes, reject, &memory_spools(12));
    assert_eq!(packed.oversized, vec!["doc-0".to_string()]);
    assert_eq!(packed.batches.len(), 1);
}
