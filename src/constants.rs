// Block Fetch Constants - SINGLE SOURCE OF TRUTH
//
// Geometry and request limits shared with the volume store.
// Runtime code reads these through `FetchConfig`; the values here are defaults.

/// Block geometry
pub mod geometry {
    /// Edge length of one block in voxels
    pub const DEFAULT_BLOCK_SIZE: usize = 32;
    pub const DEFAULT_BLOCK_VOXELS: usize =
        DEFAULT_BLOCK_SIZE * DEFAULT_BLOCK_SIZE * DEFAULT_BLOCK_SIZE;
}

/// Element widths in bytes
pub mod element {
    /// Grayscale intensity voxels
    pub const GRAY_WIDTH: usize = std::mem::size_of::<u8>();
    /// Label id voxels
    pub const LABEL_WIDTH: usize = std::mem::size_of::<u64>();
}

/// Request shaping
pub mod requests {
    /// Max blocks to request at one time
    pub const MAX_BLOCKS_PER_REQUEST: usize = 4096;
    /// Thread name prefix for per-call workers
    pub const DEFAULT_THREAD_PREFIX: &str = "block-fetch";
}
