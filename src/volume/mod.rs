//! Volume data model and the store collaborator
//!
//! Block and tile coordinates, typed 3-D arrays over immutable payloads, the
//! `VolumeClient` session trait and an in-memory store implementing it.

mod array;
mod client;
mod coords;
mod memory;

pub use array::{GrayVolume, LabelVolume, Volume};
pub use client::VolumeClient;
pub use coords::{BlockCoord, Slice2D, TileCoord, VolumeDims, VoxelOffset};
pub use memory::{FailurePoint, MemoryStore, RemoteCall};
