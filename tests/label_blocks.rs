mod common;

use block_fetch::volume::RemoteCall;
use block_fetch::{
    get_body_labelblocks, put_labelblocks, BlockCoord, BlockSpan, Bytes, FetchError, MemoryStore,
    SpanSet,
};
use common::*;

fn label_writes(calls: &[RemoteCall]) -> Vec<([i64; 3], [usize; 3])> {
    calls
        .iter()
        .filter_map(|call| match call {
            RemoteCall::PutLabels3d { offset, dims, .. } => Some((*offset, *dims)),
            _ => None,
        })
        .collect()
}

#[test]
fn test_fetch_label_blocks_in_coverage_order() {
    init_logging();
    let store = seeded_store(4);
    let fetched =
        get_body_labelblocks(&store, LABELVOL, BODY, LABELS, None, &config(4, 2)).unwrap();

    let expected: Vec<Bytes> = sample_body()
        .into_iter()
        .map(|coord| label_pattern(coord, 4, 0))
        .collect();
    assert_eq!(fetched.blocks, expected);
    assert_eq!(fetched.spans.request_count(), SAMPLE_SPANS);
    assert_eq!(fetched.spans.expand(), sample_body());
}

#[test]
fn test_precomputed_spans_skip_coverage_lookup() {
    let store = seeded_store(4);
    let spans = SpanSet::new(vec![
        BlockSpan::new(BlockCoord::new(2, 1, 0), 2, 0),
        BlockSpan::new(BlockCoord::new(0, 0, 1), 1, 2),
    ])
    .unwrap();

    let config = config(4, 2);
    let fetched =
        get_body_labelblocks(&store, LABELVOL, BODY, LABELS, Some(spans.clone()), &config).unwrap();
    assert_eq!(fetched.spans, spans);
    assert_eq!(
        fetched.blocks,
        vec![
            label_pattern(BlockCoord::new(2, 1, 0), 4, 0),
            label_pattern(BlockCoord::new(3, 1, 0), 4, 0),
            label_pattern(BlockCoord::new(0, 0, 1), 4, 0),
        ]
    );
    assert!(store
        .calls()
        .iter()
        .all(|call| !matches!(call, RemoteCall::CoarseBody { .. })));
}

#[test]
fn test_label_round_trip_through_store() {
    // fetch, relabel, write back with the same spans, fetch again
    let store = seeded_store(4);
    let fetched =
        get_body_labelblocks(&store, LABELVOL, BODY, LABELS, None, &config(4, 3)).unwrap();

    let relabeled: Vec<Bytes> = fetched
        .spans
        .expand()
        .into_iter()
        .map(|coord| label_pattern(coord, 4, 1_000))
        .collect();
    put_labelblocks(&store, LABELS, &relabeled, &fetched.spans, &config(4, 3)).unwrap();
    assert_eq!(label_writes(&store.calls()).len(), SAMPLE_SPANS);

    let config = config(4, 4);
    let refetched =
        get_body_labelblocks(&store, LABELVOL, BODY, LABELS, Some(fetched.spans), &config).unwrap();
    assert_eq!(refetched.blocks, relabeled);
    for (coord, block) in sample_body().into_iter().zip(&relabeled) {
        assert_eq!(store.label_block(LABELS, coord).as_ref(), Some(block));
    }
}

#[test]
fn test_two_block_span_writes_one_interleaved_volume() {
    let block_size = 32;
    let store = MemoryStore::new(block_size);
    let first = label_pattern(BlockCoord::new(4, 2, 1), block_size, 0);
    let second = label_pattern(BlockCoord::new(5, 2, 1), block_size, 0);
    let spans = SpanSet::new(vec![BlockSpan::new(BlockCoord::new(4, 2, 1), 2, 0)]).unwrap();

    let blocks = [first.clone(), second.clone()];
    put_labelblocks(&store, LABELS, &blocks, &spans, &config(32, 8)).unwrap();

    assert_eq!(label_writes(&store.calls()), vec![([128, 64, 32], [64, 32, 32])]);
    assert_eq!(store.label_block(LABELS, BlockCoord::new(4, 2, 1)), Some(first));
    assert_eq!(store.label_block(LABELS, BlockCoord::new(5, 2, 1)), Some(second));
}

#[test]
fn test_block_count_mismatch_rejected_before_writing() {
    let store = seeded_store(4);
    let spans = SpanSet::new(vec![BlockSpan::new(BlockCoord::new(0, 0, 0), 3, 0)]).unwrap();
    let blocks = vec![label_pattern(BlockCoord::new(0, 0, 0), 4, 0)];

    let err = put_labelblocks(&store, LABELS, &blocks, &spans, &config(4, 2)).unwrap_err();
    assert!(matches!(err, FetchError::InvariantViolation { .. }));
    assert!(label_writes(&store.calls()).is_empty());
}

#[test]
fn test_empty_write_spawns_nothing() {
    let store = seeded_store(4);
    put_labelblocks(&store, LABELS, &[], &SpanSet::default(), &config(4, 2)).unwrap();
    assert!(store.calls().is_empty());
}

#[test]
fn test_unknown_body_not_found() {
    let store = seeded_store(4);
    let err = get_body_labelblocks(&store, LABELVOL, 404, LABELS, None, &config(4, 2)).unwrap_err();
    assert!(matches!(err, FetchError::NotFound { body_id: 404, .. }));
}

#[test]
fn test_oversized_precomputed_span_rejected() {
    let store = seeded_store(4);
    let config = config(4, 2).with_max_blocks_per_request(2);
    let spans = SpanSet::new(vec![BlockSpan::new(BlockCoord::new(0, 0, 0), 5, 0)]).unwrap();

    let err = get_body_labelblocks(&store, LABELVOL, BODY, LABELS, Some(spans.clone()), &config)
        .unwrap_err();
    assert!(matches!(err, FetchError::InvariantViolation { .. }));

    let blocks: Vec<Bytes> = spans
        .expand()
        .into_iter()
        .map(|coord| label_pattern(coord, 4, 0))
        .collect();
    let err = put_labelblocks(&store, LABELS, &blocks, &spans, &config).unwrap_err();
    assert!(matches!(err, FetchError::InvariantViolation { .. }));
    assert!(store.calls().is_empty());
}
