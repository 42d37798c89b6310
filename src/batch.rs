//! Batched block and tile transfers
//!
//! Each entry point coalesces (for body-based calls), partitions the units
//! across a fresh worker pool, joins every worker and only then inspects
//! the outcome. Output order always follows the coverage or tile list:
//! slot `i` is filled by whichever worker owns unit range containing `i`,
//! fixed before any worker starts.

use bytes::Bytes;

use crate::config::FetchConfig;
use crate::error::{invariant_violation, FetchResult};
use crate::fetch::{GrayBlockFetcher, LabelBlockFetcher, LabelBlockWriter, TileFetcher};
use crate::partition::{split_disjoint, WorkPartitioner, WorkRange};
use crate::pool::{settle, WorkerPool};
use crate::spans::{Coalescing, SpanCoalescer, SpanSet};
use crate::volume::{Slice2D, TileCoord, VolumeClient};

/// Label blocks of a body together with the spans they were fetched with
///
/// The spans can be handed back to [`put_labelblocks`] after the blocks
/// have been edited.
#[derive(Debug, Clone)]
pub struct BodyBlocks {
    pub spans: SpanSet,
    pub blocks: Vec<Bytes>,
}

/// Fetch every grayscale block covered by a body
///
/// Blocks come back in coverage order (z, then y, then x). Coalescing mode,
/// block-native requests, worker count and span limit come from `config`.
pub fn get_body_blocks<C: VolumeClient>(
    client: &C,
    labelvol: &str,
    grayscale: &str,
    body_id: u64,
    config: &FetchConfig,
) -> FetchResult<Vec<Bytes>> {
    config.validate()?;
    let coalescer = SpanCoalescer::new(config.coalescing, config.max_blocks_per_request);
    let spans = coalescer.spans_for_body(&mut client.clone(), labelvol, body_id)?;

    let block_size = config.block_size;
    let block_native = config.block_native;
    let blocks = fetch_span_blocks(client, &spans, config, |session, range, slots, base| {
        let mut fetcher = GrayBlockFetcher::new(session, grayscale, block_size, block_native);
        fetcher.fetch_spans(&spans.as_slice()[range.range()], slots, base)
    })?;

    log::info!(
        "Performed {} requests for {} gray blocks of body {}",
        spans.request_count(),
        blocks.len(),
        body_id
    );
    Ok(blocks)
}

/// Fetch every label block covered by a body
///
/// When `spans` is `None` (or empty) the body's coverage is looked up and
/// greedily coalesced; otherwise the given spans are validated and used as-is.
pub fn get_body_labelblocks<C: VolumeClient>(
    client: &C,
    labelvol: &str,
    body_id: u64,
    labels: &str,
    spans: Option<SpanSet>,
    config: &FetchConfig,
) -> FetchResult<BodyBlocks> {
    config.validate()?;
    let spans = match spans {
        Some(spans) if !spans.is_empty() => {
            spans.validate()?;
            spans.check_run_limit(config.max_blocks_per_request)?;
            spans
        }
        _ => SpanCoalescer::new(Coalescing::Greedy, config.max_blocks_per_request)
            .spans_for_body(&mut client.clone(), labelvol, body_id)?,
    };

    let block_size = config.block_size;
    let blocks = fetch_span_blocks(client, &spans, config, |session, range, slots, base| {
        let mut fetcher = LabelBlockFetcher::new(session, labels, block_size);
        fetcher.fetch_spans(&spans.as_slice()[range.range()], slots, base)
    })?;

    log::info!(
        "Performed {} requests for {} label blocks of body {}",
        spans.request_count(),
        blocks.len(),
        body_id
    );
    Ok(BodyBlocks { spans, blocks })
}

/// Write label blocks back, one request per span
///
/// `blocks[i]` is the block at output offset `i` of `spans`. Returns once
/// every span has been written, or with the first worker's error after all
/// workers have stopped.
pub fn put_labelblocks<C: VolumeClient>(
    client: &C,
    labels: &str,
    blocks: &[Bytes],
    spans: &SpanSet,
    config: &FetchConfig,
) -> FetchResult<()> {
    config.validate()?;
    spans.validate()?;
    spans.check_run_limit(config.max_blocks_per_request)?;
    if spans.total_blocks() != blocks.len() {
        return Err(invariant_violation(format!(
            "spans cover {} blocks but {} were supplied",
            spans.total_blocks(),
            blocks.len()
        )));
    }
    if spans.is_empty() {
        return Ok(());
    }

    let ranges = WorkPartitioner::partition(spans.len(), config.worker_count);
    WorkPartitioner::check_coverage(&ranges, spans.len())?;

    let block_size = config.block_size;
    let jobs: Vec<_> = ranges
        .iter()
        .map(|&range| {
            let span_slice = &spans.as_slice()[range.range()];
            let session = client.clone();
            (range, move || {
                let mut writer = LabelBlockWriter::new(session, labels, block_size);
                writer.write_spans(span_slice, blocks)
            })
        })
        .collect();

    let pool = WorkerPool::new(ranges.len(), &config.thread_name_prefix)?;
    settle(pool.run(jobs), ranges.len(), spans.len())?;

    log::info!(
        "Performed {} requests writing {} label blocks",
        spans.request_count(),
        blocks.len()
    );
    Ok(())
}

/// Fetch tiles in list order
///
/// A `config.worker_count` of zero runs one worker per tile. An empty tile
/// list returns an empty result without starting any worker.
pub fn get_tile_array_binary<C: VolumeClient>(
    client: &C,
    instance: &str,
    orientation: Slice2D,
    scale: u32,
    tiles: &[TileCoord],
    config: &FetchConfig,
) -> FetchResult<Vec<Bytes>> {
    config.validate()?;
    if tiles.is_empty() {
        return Ok(Vec::new());
    }
    let workers = match config.worker_count {
        0 => tiles.len(),
        requested => requested,
    };

    let ranges = WorkPartitioner::partition(tiles.len(), workers);
    WorkPartitioner::check_coverage(&ranges, tiles.len())?;

    let mut slots: Vec<Option<Bytes>> = vec![None; tiles.len()];
    {
        let parts = split_disjoint(&mut slots, ranges.iter().map(|r| r.count))?;
        let jobs: Vec<_> = ranges
            .iter()
            .zip(parts)
            .map(|(&range, part)| {
                let tile_slice = &tiles[range.range()];
                let session = client.clone();
                (range, move || {
                    let mut fetcher = TileFetcher::new(session, instance, orientation, scale);
                    fetcher.fetch_tiles(tile_slice, part)
                })
            })
            .collect();

        let pool = WorkerPool::new(ranges.len(), &config.thread_name_prefix)?;
        settle(pool.run(jobs), ranges.len(), tiles.len())?;
    }

    log::info!("Performed {} tile requests on '{}'", tiles.len(), instance);
    collect_slots(slots)
}

/// Run span-based fetch jobs and gather the filled block array
///
/// `work` receives a worker's own client session, its span range, its
/// output slots and the block index of its first slot. Sessions are cloned
/// here, on the calling thread, and moved into the workers.
fn fetch_span_blocks<C, F>(
    client: &C,
    spans: &SpanSet,
    config: &FetchConfig,
    work: F,
) -> FetchResult<Vec<Bytes>>
where
    C: VolumeClient,
    F: Fn(C, WorkRange, &mut [Option<Bytes>], usize) -> (usize, FetchResult<()>) + Sync,
{
    if spans.is_empty() {
        return Ok(Vec::new());
    }
    let ranges = WorkPartitioner::partition(spans.len(), config.worker_count);
    WorkPartitioner::check_coverage(&ranges, spans.len())?;

    let mut slots: Vec<Option<Bytes>> = vec![None; spans.total_blocks()];
    {
        let block_ranges: Vec<_> = ranges.iter().map(|r| spans.block_range(r.range())).collect();
        let parts = split_disjoint(&mut slots, block_ranges.iter().map(|b| b.len()))?;
        let work = &work;
        let jobs: Vec<_> = ranges
            .iter()
            .zip(block_ranges.iter())
            .zip(parts)
            .map(|((&range, blocks), part)| {
                let base = blocks.start;
                let session = client.clone();
                (range, move || work(session, range, part, base))
            })
            .collect();

        let pool = WorkerPool::new(ranges.len(), &config.thread_name_prefix)?;
        settle(pool.run(jobs), ranges.len(), spans.len())?;
    }

    collect_slots(slots)
}

/// Unwrap filled output slots; an empty slot means bookkeeping went wrong
fn collect_slots(slots: Vec<Option<Bytes>>) -> FetchResult<Vec<Bytes>> {
    let total = slots.len();
    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.ok_or_else(|| {
                invariant_violation(format!("output slot {} of {} left empty", index, total))
            })
        })
        .collect()
}
