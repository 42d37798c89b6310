//! Strided copies between a run volume and per-block buffers
//!
//! A span of `n` blocks is read or written as one volume of
//! `(n * block_size, block_size, block_size)` voxels. Inside it each x-row
//! of a z-slice crosses all `n` blocks, so extracting one block means
//! walking z, then y, and copying the block's part of every row.
//! [`copy_box`] is the only place that does this arithmetic; the fetch and
//! write paths both go through it.

use bytes::Bytes;

use crate::error::{invariant_violation, FetchResult};
use crate::volume::VolumeDims;

/// View of a flat buffer as a 3-D array, x fastest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout3 {
    pub dims: VolumeDims,
    pub element_width: usize,
}

impl Layout3 {
    pub fn new(dims: VolumeDims, element_width: usize) -> Self {
        Self { dims, element_width }
    }

    /// Layout of a single cubic block
    pub fn block(block_size: usize, element_width: usize) -> Self {
        Self::new([block_size, block_size, block_size], element_width)
    }

    /// Layout of `run_length` blocks packed along x
    pub fn run(block_size: usize, run_length: usize, element_width: usize) -> Self {
        Self::new([block_size * run_length, block_size, block_size], element_width)
    }

    pub fn byte_len(&self) -> usize {
        self.dims.iter().product::<usize>() * self.element_width
    }

    /// Byte offset of element (x, y, z)
    #[inline]
    pub fn offset(&self, x: usize, y: usize, z: usize) -> usize {
        ((z * self.dims[1] + y) * self.dims[0] + x) * self.element_width
    }

    fn contains_box(&self, origin: [usize; 3], extent: [usize; 3]) -> bool {
        (0..3).all(|axis| origin[axis] + extent[axis] <= self.dims[axis])
    }
}

/// Copy an axis-aligned box of `extent` elements from `src` at `src_origin`
/// into `dst` at `dst_origin`
pub fn copy_box(
    src: &[u8],
    src_layout: Layout3,
    src_origin: [usize; 3],
    dst: &mut [u8],
    dst_layout: Layout3,
    dst_origin: [usize; 3],
    extent: [usize; 3],
) -> FetchResult<()> {
    if src_layout.element_width != dst_layout.element_width {
        return Err(invariant_violation(format!(
            "element width mismatch: {} vs {}",
            src_layout.element_width, dst_layout.element_width
        )));
    }
    if src.len() != src_layout.byte_len() || dst.len() != dst_layout.byte_len() {
        return Err(invariant_violation(format!(
            "buffer sizes {}/{} do not match layouts {:?}/{:?}",
            src.len(),
            dst.len(),
            src_layout.dims,
            dst_layout.dims
        )));
    }
    if !src_layout.contains_box(src_origin, extent)
        || !dst_layout.contains_box(dst_origin, extent)
    {
        return Err(invariant_violation(format!(
            "box {:?} at {:?} -> {:?} exceeds layouts {:?}/{:?}",
            extent, src_origin, dst_origin, src_layout.dims, dst_layout.dims
        )));
    }

    let row_bytes = extent[0] * src_layout.element_width;
    for z in 0..extent[2] {
        for y in 0..extent[1] {
            let from = src_layout.offset(src_origin[0], src_origin[1] + y, src_origin[2] + z);
            let to = dst_layout.offset(dst_origin[0], dst_origin[1] + y, dst_origin[2] + z);
            dst[to..to + row_bytes].copy_from_slice(&src[from..from + row_bytes]);
        }
    }
    Ok(())
}

/// Split a run volume into `run_length` independent block buffers
pub fn deinterleave_run(
    run: &[u8],
    block_size: usize,
    run_length: usize,
    element_width: usize,
) -> FetchResult<Vec<Bytes>> {
    let run_layout = Layout3::run(block_size, run_length, element_width);
    let block_layout = Layout3::block(block_size, element_width);

    let mut blocks = Vec::with_capacity(run_length);
    for j in 0..run_length {
        let mut block = vec![0u8; block_layout.byte_len()];
        copy_box(
            run,
            run_layout,
            [j * block_size, 0, 0],
            &mut block,
            block_layout,
            [0, 0, 0],
            block_layout.dims,
        )?;
        blocks.push(Bytes::from(block));
    }
    Ok(blocks)
}

/// Pack block buffers side by side along x into one run volume
pub fn interleave_run<B: AsRef<[u8]>>(
    blocks: &[B],
    block_size: usize,
    element_width: usize,
) -> FetchResult<Vec<u8>> {
    let run_layout = Layout3::run(block_size, blocks.len(), element_width);
    let block_layout = Layout3::block(block_size, element_width);

    let mut run = vec![0u8; run_layout.byte_len()];
    for (j, block) in blocks.iter().enumerate() {
        copy_box(
            block.as_ref(),
            block_layout,
            [0, 0, 0],
            &mut run,
            run_layout,
            [j * block_size, 0, 0],
            block_layout.dims,
        )?;
    }
    Ok(run)
}
