use bytes::Bytes;

use crate::error::{invariant_violation, FetchResult};
use crate::volume::{Slice2D, TileCoord, VolumeClient};

/// Fetches tiles one request at a time; tiles are never merged
pub struct TileFetcher<'a, C> {
    client: C,
    instance: &'a str,
    orientation: Slice2D,
    scale: u32,
}

impl<'a, C: VolumeClient> TileFetcher<'a, C> {
    pub fn new(client: C, instance: &'a str, orientation: Slice2D, scale: u32) -> Self {
        Self {
            client,
            instance,
            orientation,
            scale,
        }
    }

    /// Fetch `tiles[i]` into `slots[i]`
    pub fn fetch_tiles(
        &mut self,
        tiles: &[TileCoord],
        slots: &mut [Option<Bytes>],
    ) -> (usize, FetchResult<()>) {
        if tiles.len() != slots.len() {
            return (
                0,
                Err(invariant_violation(format!(
                    "{} tiles for {} output slots",
                    tiles.len(),
                    slots.len()
                ))),
            );
        }
        for (done, (tile, slot)) in tiles.iter().zip(slots.iter_mut()).enumerate() {
            match self
                .client
                .get_tile_slice(self.instance, self.orientation, self.scale, *tile)
            {
                Ok(payload) => *slot = Some(payload),
                Err(e) => return (done, Err(e)),
            }
        }
        (tiles.len(), Ok(()))
    }
}
