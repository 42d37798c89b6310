use bytes::Bytes;

use super::{BlockCoord, GrayVolume, LabelVolume, Slice2D, TileCoord, VolumeDims, VoxelOffset};
use crate::error::FetchResult;

/// Session with a block-addressed volume store
///
/// A client is bound to one remote endpoint and is not shared between
/// threads: every worker receives its own clone and drives it through
/// `&mut self`. Implementations report failures as
/// [`FetchError::RemoteCall`](crate::FetchError::RemoteCall).
pub trait VolumeClient: Clone + Send {
    /// Blocks covered by a body, sorted by z, then y, then x.
    /// An unknown body yields an empty list.
    fn coarse_body(&mut self, labelvol: &str, body_id: u64) -> FetchResult<Vec<BlockCoord>>;

    /// Read an intensity sub-volume
    fn get_gray3d(
        &mut self,
        instance: &str,
        dims: VolumeDims,
        offset: VoxelOffset,
    ) -> FetchResult<GrayVolume>;

    /// Read a label sub-volume
    fn get_labels3d(
        &mut self,
        instance: &str,
        dims: VolumeDims,
        offset: VoxelOffset,
    ) -> FetchResult<LabelVolume>;

    /// Read `span` consecutive blocks along x starting at `start`, in the
    /// store's own block layout
    fn get_grayblocks(
        &mut self,
        instance: &str,
        start: BlockCoord,
        span: usize,
    ) -> FetchResult<Vec<Bytes>>;

    /// Write a label sub-volume
    fn put_labels3d(
        &mut self,
        instance: &str,
        volume: &LabelVolume,
        offset: VoxelOffset,
    ) -> FetchResult<()>;

    /// Read one encoded tile
    fn get_tile_slice(
        &mut self,
        instance: &str,
        orientation: Slice2D,
        scale: u32,
        tile: TileCoord,
    ) -> FetchResult<Bytes>;
}
