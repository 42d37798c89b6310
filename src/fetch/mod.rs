//! Per-worker transfer logic
//!
//! Each fetcher owns its own client session and processes a contiguous
//! slice of spans (or tiles), writing only to the output slots it was given.

pub mod gray;
pub mod label;
pub mod tiles;
pub mod writer;

pub use gray::GrayBlockFetcher;
pub use label::LabelBlockFetcher;
pub use tiles::TileFetcher;
pub use writer::LabelBlockWriter;

use bytes::Bytes;

use crate::error::{invariant_violation, remote_call_failed, FetchResult};
use crate::reshape::deinterleave_run;
use crate::spans::BlockSpan;

/// Output slots of `span` within a worker's slice starting at block `base`
pub(crate) fn span_slots<'o>(
    slots: &'o mut [Option<Bytes>],
    base: usize,
    span: &BlockSpan,
) -> FetchResult<&'o mut [Option<Bytes>]> {
    let range = span.block_range();
    let available = base..base + slots.len();
    if range.start < available.start || range.end > available.end {
        return Err(invariant_violation(format!(
            "span blocks {:?} outside worker output {:?}",
            range, available
        )));
    }
    Ok(&mut slots[range.start - base..range.end - base])
}

/// Distribute a span's run volume over its block slots
///
/// A single-block run is handed on as-is; longer runs are de-interleaved
/// into fresh per-block buffers.
pub(crate) fn scatter_run(
    run: Bytes,
    operation: &str,
    instance: &str,
    block_size: usize,
    element_width: usize,
    slots: &mut [Option<Bytes>],
) -> FetchResult<()> {
    let run_length = slots.len();
    let expected = block_size * block_size * block_size * element_width * run_length;
    if run.len() != expected {
        return Err(remote_call_failed(
            operation,
            instance,
            format!("expected {} bytes for {} blocks, got {}", expected, run_length, run.len()),
        ));
    }

    if run_length == 1 {
        slots[0] = Some(run);
        return Ok(());
    }

    let blocks = deinterleave_run(&run, block_size, run_length, element_width)?;
    for (slot, block) in slots.iter_mut().zip(blocks) {
        *slot = Some(block);
    }
    Ok(())
}
