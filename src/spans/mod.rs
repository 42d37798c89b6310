//! Block spans: runs of blocks along x fetched with a single request

mod coalescer;

pub use coalescer::{Coalescing, SpanCoalescer};

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{invariant_violation, FetchResult};
use crate::volume::{BlockCoord, VolumeDims, VoxelOffset};

/// `run_length` contiguous blocks at (xmin..xmin+run_length, y, z)
///
/// `output_offset` is the index of the span's first block in the caller's
/// block buffer array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockSpan {
    pub xmin: i32,
    pub y: i32,
    pub z: i32,
    pub run_length: usize,
    pub output_offset: usize,
}

impl BlockSpan {
    pub fn new(start: BlockCoord, run_length: usize, output_offset: usize) -> Self {
        Self {
            xmin: start.x,
            y: start.y,
            z: start.z,
            run_length,
            output_offset,
        }
    }

    pub fn start(&self) -> BlockCoord {
        BlockCoord::new(self.xmin, self.y, self.z)
    }

    /// Last x covered by the span
    pub fn xmax(&self) -> i32 {
        self.xmin + self.run_length as i32 - 1
    }

    /// Indices of the span's blocks in the output array
    pub fn block_range(&self) -> Range<usize> {
        self.output_offset..self.output_offset + self.run_length
    }

    /// Voxel offset of the span's bounding volume
    pub fn voxel_offset(&self, block_size: usize) -> VoxelOffset {
        self.start().to_voxel_offset(block_size)
    }

    /// Voxel dimensions of the span's bounding volume
    pub fn volume_dims(&self, block_size: usize) -> VolumeDims {
        [block_size * self.run_length, block_size, block_size]
    }

    pub fn coords(&self) -> impl Iterator<Item = BlockCoord> + '_ {
        (0..self.run_length as i32).map(move |i| BlockCoord::new(self.xmin + i, self.y, self.z))
    }
}

/// Ordered spans whose output offsets partition `[0, total_blocks)`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanSet {
    spans: Vec<BlockSpan>,
}

impl SpanSet {
    /// Build a span set, checking run lengths and offset contiguity
    pub fn new(spans: Vec<BlockSpan>) -> FetchResult<Self> {
        let set = Self { spans };
        set.validate()?;
        Ok(set)
    }

    pub(crate) fn from_validated(spans: Vec<BlockSpan>) -> Self {
        debug_assert!(Self { spans: spans.clone() }.validate().is_ok());
        Self { spans }
    }

    pub fn validate(&self) -> FetchResult<()> {
        let mut expected_offset = 0;
        for (index, span) in self.spans.iter().enumerate() {
            if span.run_length == 0 {
                return Err(invariant_violation(format!("span {} has zero run length", index)));
            }
            if span.output_offset != expected_offset {
                return Err(invariant_violation(format!(
                    "span {} starts at block {} but {} blocks precede it",
                    index, span.output_offset, expected_offset
                )));
            }
            expected_offset += span.run_length;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Number of remote requests needed, one per span
    pub fn request_count(&self) -> usize {
        self.spans.len()
    }

    pub fn total_blocks(&self) -> usize {
        self.spans.iter().map(|span| span.run_length).sum()
    }

    pub fn as_slice(&self) -> &[BlockSpan] {
        &self.spans
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BlockSpan> {
        self.spans.iter()
    }

    /// Block range covered by spans `range` of this set
    pub fn block_range(&self, range: Range<usize>) -> Range<usize> {
        let last = range.end.checked_sub(1).and_then(|i| self.spans.get(i));
        match (self.spans.get(range.start), last) {
            (Some(first), Some(last)) if range.start < range.end => {
                first.output_offset..last.block_range().end
            }
            _ => 0..0,
        }
    }

    /// Re-expand spans into block coordinates in output order
    pub fn expand(&self) -> Vec<BlockCoord> {
        self.spans.iter().flat_map(|span| span.coords()).collect()
    }

    /// Reject any span that would need more than `max_run` blocks in one request
    pub fn check_run_limit(&self, max_run: usize) -> FetchResult<()> {
        match self.spans.iter().position(|span| span.run_length > max_run) {
            Some(index) => Err(invariant_violation(format!(
                "span {} has {} blocks, more than the {} allowed per request",
                index, self.spans[index].run_length, max_run
            ))),
            None => Ok(()),
        }
    }
}

impl<'a> IntoIterator for &'a SpanSet {
    type Item = &'a BlockSpan;
    type IntoIter = std::slice::Iter<'a, BlockSpan>;

    fn into_iter(self) -> Self::IntoIter {
        self.spans.iter()
    }
}
