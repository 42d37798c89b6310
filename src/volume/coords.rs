use serde::{Deserialize, Serialize};

/// Voxel offset of a sub-volume in the store (x, y, z)
pub type VoxelOffset = [i64; 3];

/// Dimensions of a sub-volume in voxels (x, y, z)
pub type VolumeDims = [usize; 3];

/// Position of a block in the store (block units, not voxels)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockCoord {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// First voxel covered by this block
    pub fn to_voxel_offset(&self, block_size: usize) -> VoxelOffset {
        let size = block_size as i64;
        [self.x as i64 * size, self.y as i64 * size, self.z as i64 * size]
    }

    /// Block containing the given voxel
    pub fn from_voxel_offset(offset: VoxelOffset, block_size: usize) -> Self {
        let size = block_size as i64;
        Self::new(
            offset[0].div_euclid(size) as i32,
            offset[1].div_euclid(size) as i32,
            offset[2].div_euclid(size) as i32,
        )
    }

    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Ordering key used by coverage lists: z, then y, then x
    pub fn zyx(&self) -> (i32, i32, i32) {
        (self.z, self.y, self.x)
    }
}

/// Plane a tile is cut along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slice2D {
    XY,
    XZ,
    YZ,
}

impl Slice2D {
    pub fn as_str(&self) -> &'static str {
        match self {
            Slice2D::XY => "xy",
            Slice2D::XZ => "xz",
            Slice2D::YZ => "yz",
        }
    }
}

impl std::fmt::Display for Slice2D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tile address: column and row in the tile plane plus the slice index
/// along the remaining axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl TileCoord {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}
