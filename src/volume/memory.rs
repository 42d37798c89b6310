//! In-process volume store
//!
//! `MemoryStore` keeps grayscale and label data as per-block payloads in
//! concurrent maps and serves block-aligned sub-volume reads and writes from
//! them. Clones share the same data, so every worker can hold its own
//! session while observing one store. Every call is recorded, and failures
//! can be injected at a voxel offset or tile address.

use std::sync::Arc;

use bytemuck::Pod;
use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::Mutex;

use super::{
    BlockCoord, GrayVolume, LabelVolume, Slice2D, TileCoord, Volume, VolumeClient, VolumeDims,
    VoxelOffset,
};
use crate::constants::element;
use crate::error::{remote_call_failed, FetchResult};
use crate::reshape::{copy_box, Layout3};

/// A call received by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    CoarseBody { instance: String, body_id: u64 },
    GetGray3d { instance: String, dims: VolumeDims, offset: VoxelOffset },
    GetLabels3d { instance: String, dims: VolumeDims, offset: VoxelOffset },
    GetGrayBlocks { instance: String, start: BlockCoord, span: usize },
    PutLabels3d { instance: String, dims: VolumeDims, offset: VoxelOffset },
    GetTile { instance: String, orientation: Slice2D, scale: u32, tile: TileCoord },
}

/// Where an injected failure triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    /// Any sub-volume read or write starting at this offset
    VoxelOffset(VoxelOffset),
    /// Any tile read at this address
    Tile(TileCoord),
}

type BlockKey = (String, BlockCoord);
type TileKey = (String, Slice2D, u32, TileCoord);

#[derive(Debug, Default)]
struct StoreData {
    gray: DashMap<BlockKey, Bytes>,
    labels: DashMap<BlockKey, Bytes>,
    bodies: DashMap<(String, u64), Vec<BlockCoord>>,
    tiles: DashMap<TileKey, Bytes>,
    calls: Mutex<Vec<RemoteCall>>,
    failures: Mutex<Vec<FailurePoint>>,
}

/// Block store held in memory
#[derive(Debug, Clone)]
pub struct MemoryStore {
    block_size: usize,
    data: Arc<StoreData>,
}

impl MemoryStore {
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size,
            data: Arc::new(StoreData::default()),
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Register the coarse coverage of a body; stored sorted by z, y, x
    pub fn insert_body(&self, labelvol: &str, body_id: u64, mut blocks: Vec<BlockCoord>) {
        blocks.sort_by_key(|coord| coord.zyx());
        blocks.dedup();
        self.data.bodies.insert((labelvol.to_string(), body_id), blocks);
    }

    pub fn insert_gray_block(&self, instance: &str, coord: BlockCoord, block: Bytes) {
        self.data.gray.insert((instance.to_string(), coord), block);
    }

    pub fn insert_label_block(&self, instance: &str, coord: BlockCoord, block: Bytes) {
        self.data.labels.insert((instance.to_string(), coord), block);
    }

    pub fn insert_tile(
        &self,
        instance: &str,
        orientation: Slice2D,
        scale: u32,
        tile: TileCoord,
        payload: Bytes,
    ) {
        self.data
            .tiles
            .insert((instance.to_string(), orientation, scale, tile), payload);
    }

    pub fn gray_block(&self, instance: &str, coord: BlockCoord) -> Option<Bytes> {
        self.data
            .gray
            .get(&(instance.to_string(), coord))
            .map(|entry| entry.value().clone())
    }

    pub fn label_block(&self, instance: &str, coord: BlockCoord) -> Option<Bytes> {
        self.data
            .labels
            .get(&(instance.to_string(), coord))
            .map(|entry| entry.value().clone())
    }

    /// Make every call touching `point` fail
    pub fn fail_at(&self, point: FailurePoint) {
        self.data.failures.lock().push(point);
    }

    /// Calls received so far, in arrival order
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.data.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.data.calls.lock().clear();
    }

    fn record(&self, call: RemoteCall) {
        log::trace!("MemoryStore received {:?}", call);
        self.data.calls.lock().push(call);
    }

    fn check_failure(
        &self,
        point: FailurePoint,
        operation: &str,
        instance: &str,
    ) -> FetchResult<()> {
        if self.data.failures.lock().contains(&point) {
            return Err(remote_call_failed(
                operation,
                instance,
                format!("injected failure at {:?}", point),
            ));
        }
        Ok(())
    }

    /// Blocks spanned by a block-aligned sub-volume
    fn block_extent(
        &self,
        operation: &str,
        instance: &str,
        dims: VolumeDims,
        offset: VoxelOffset,
    ) -> FetchResult<(BlockCoord, [usize; 3])> {
        let size = self.block_size;
        let aligned = dims.iter().all(|&d| d > 0 && d % size == 0)
            && offset.iter().all(|&o| o.rem_euclid(size as i64) == 0);
        if !aligned {
            return Err(remote_call_failed(
                operation,
                instance,
                format!("dims {:?} at {:?} not aligned to block size {}", dims, offset, size),
            ));
        }
        let origin = BlockCoord::from_voxel_offset(offset, size);
        Ok((origin, [dims[0] / size, dims[1] / size, dims[2] / size]))
    }

    fn read_volume<T: Pod>(
        &self,
        blocks: &DashMap<BlockKey, Bytes>,
        operation: &str,
        instance: &str,
        dims: VolumeDims,
        offset: VoxelOffset,
    ) -> FetchResult<Volume<T>> {
        let (origin, counts) = self.block_extent(operation, instance, dims, offset)?;
        let width = std::mem::size_of::<T>();
        let volume_layout = Layout3::new(dims, width);
        let block_layout = Layout3::block(self.block_size, width);
        let mut buffer = vec![0u8; volume_layout.byte_len()];

        for bz in 0..counts[2] {
            for by in 0..counts[1] {
                for bx in 0..counts[0] {
                    let coord = origin.offset(bx as i32, by as i32, bz as i32);
                    let Some(block) = blocks.get(&(instance.to_string(), coord)) else {
                        continue;
                    };
                    copy_box(
                        block.value(),
                        block_layout,
                        [0, 0, 0],
                        &mut buffer,
                        volume_layout,
                        [bx * self.block_size, by * self.block_size, bz * self.block_size],
                        block_layout.dims,
                    )
                    .map_err(|e| remote_call_failed(operation, instance, e))?;
                }
            }
        }
        Volume::from_bytes(dims, Bytes::from(buffer))
    }
}

impl VolumeClient for MemoryStore {
    fn coarse_body(&mut self, labelvol: &str, body_id: u64) -> FetchResult<Vec<BlockCoord>> {
        self.record(RemoteCall::CoarseBody {
            instance: labelvol.to_string(),
            body_id,
        });
        Ok(self
            .data
            .bodies
            .get(&(labelvol.to_string(), body_id))
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    fn get_gray3d(
        &mut self,
        instance: &str,
        dims: VolumeDims,
        offset: VoxelOffset,
    ) -> FetchResult<GrayVolume> {
        self.record(RemoteCall::GetGray3d {
            instance: instance.to_string(),
            dims,
            offset,
        });
        self.check_failure(FailurePoint::VoxelOffset(offset), "get_gray3d", instance)?;
        self.read_volume(&self.data.gray, "get_gray3d", instance, dims, offset)
    }

    fn get_labels3d(
        &mut self,
        instance: &str,
        dims: VolumeDims,
        offset: VoxelOffset,
    ) -> FetchResult<LabelVolume> {
        self.record(RemoteCall::GetLabels3d {
            instance: instance.to_string(),
            dims,
            offset,
        });
        self.check_failure(FailurePoint::VoxelOffset(offset), "get_labels3d", instance)?;
        self.read_volume(&self.data.labels, "get_labels3d", instance, dims, offset)
    }

    fn get_grayblocks(
        &mut self,
        instance: &str,
        start: BlockCoord,
        span: usize,
    ) -> FetchResult<Vec<Bytes>> {
        self.record(RemoteCall::GetGrayBlocks {
            instance: instance.to_string(),
            start,
            span,
        });
        self.check_failure(
            FailurePoint::VoxelOffset(start.to_voxel_offset(self.block_size)),
            "get_grayblocks",
            instance,
        )?;
        let block_bytes = Layout3::block(self.block_size, element::GRAY_WIDTH).byte_len();
        let empty = Bytes::from(vec![0u8; block_bytes]);
        Ok((0..span)
            .map(|i| {
                self.gray_block(instance, start.offset(i as i32, 0, 0))
                    .unwrap_or_else(|| empty.clone())
            })
            .collect())
    }

    fn put_labels3d(
        &mut self,
        instance: &str,
        volume: &LabelVolume,
        offset: VoxelOffset,
    ) -> FetchResult<()> {
        let dims = volume.dims();
        self.record(RemoteCall::PutLabels3d {
            instance: instance.to_string(),
            dims,
            offset,
        });
        self.check_failure(FailurePoint::VoxelOffset(offset), "put_labels3d", instance)?;
        let (origin, counts) = self.block_extent("put_labels3d", instance, dims, offset)?;

        let volume_layout = Layout3::new(dims, element::LABEL_WIDTH);
        let block_layout = Layout3::block(self.block_size, element::LABEL_WIDTH);
        for bz in 0..counts[2] {
            for by in 0..counts[1] {
                for bx in 0..counts[0] {
                    let mut block = vec![0u8; block_layout.byte_len()];
                    copy_box(
                        volume.as_raw(),
                        volume_layout,
                        [bx * self.block_size, by * self.block_size, bz * self.block_size],
                        &mut block,
                        block_layout,
                        [0, 0, 0],
                        block_layout.dims,
                    )
                    .map_err(|e| remote_call_failed("put_labels3d", instance, e))?;
                    let coord = origin.offset(bx as i32, by as i32, bz as i32);
                    self.insert_label_block(instance, coord, Bytes::from(block));
                }
            }
        }
        Ok(())
    }

    fn get_tile_slice(
        &mut self,
        instance: &str,
        orientation: Slice2D,
        scale: u32,
        tile: TileCoord,
    ) -> FetchResult<Bytes> {
        self.record(RemoteCall::GetTile {
            instance: instance.to_string(),
            orientation,
            scale,
            tile,
        });
        self.check_failure(FailurePoint::Tile(tile), "get_tile_slice", instance)?;
        self.data
            .tiles
            .get(&(instance.to_string(), orientation, scale, tile))
            .map(|entry| entry.value().clone())
            .ok_or_else(|| {
                remote_call_failed(
                    "get_tile_slice",
                    instance,
                    format!("no {} tile at {:?} scale {}", orientation, tile, scale),
                )
            })
    }
}
