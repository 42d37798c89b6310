//! Batched, concurrent block transfer against a block-addressed volume store
//!
//! Given a body id (whose coverage is a sparse set of blocks) or an explicit
//! tile list, the entry points in [`batch`] issue the fewest remote requests
//! that cover it, spread them over a per-call worker pool and return one
//! payload per block (or tile) in the caller's order.

pub mod batch;
pub mod config;
pub mod constants;
pub mod error;
pub mod fetch;
pub mod partition;
pub mod pool;
pub mod reshape;
pub mod spans;
pub mod volume;

pub use batch::{
    get_body_blocks, get_body_labelblocks, get_tile_array_binary, put_labelblocks, BodyBlocks,
};
pub use bytes::Bytes;
pub use config::FetchConfig;
pub use error::{FetchError, FetchResult};
pub use partition::{WorkPartitioner, WorkRange};
pub use spans::{BlockSpan, Coalescing, SpanCoalescer, SpanSet};
pub use volume::{
    BlockCoord, GrayVolume, LabelVolume, MemoryStore, Slice2D, TileCoord, Volume, VolumeClient,
};
