#![allow(dead_code)]

use block_fetch::{BlockCoord, Bytes, FetchConfig, MemoryStore};

pub const LABELVOL: &str = "bodies";
pub const GRAY: &str = "grayscale";
pub const LABELS: &str = "segmentation";
pub const BODY: u64 = 7;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Small blocks keep the fixtures fast
pub fn config(block_size: usize, workers: usize) -> FetchConfig {
    FetchConfig::default()
        .with_block_size(block_size)
        .with_workers(workers)
}

/// Body coverage in z, y, x order: five x-runs
///
/// z=0 y=0: x 0..5 and x 7; z=0 y=1: x 2..4; z=1: x 0; z=2: x 10..13
pub fn sample_body() -> Vec<BlockCoord> {
    let mut coords = Vec::new();
    coords.extend((0..5).map(|x| BlockCoord::new(x, 0, 0)));
    coords.push(BlockCoord::new(7, 0, 0));
    coords.extend((2..4).map(|x| BlockCoord::new(x, 1, 0)));
    coords.push(BlockCoord::new(0, 0, 1));
    coords.extend((10..13).map(|x| BlockCoord::new(x, 0, 2)));
    coords
}

pub const SAMPLE_SPANS: usize = 5;

/// Grayscale block whose every voxel depends on block and voxel position
pub fn gray_pattern(coord: BlockCoord, block_size: usize) -> Bytes {
    let voxels = block_size * block_size * block_size;
    let seed = (coord.x * 31 + coord.y * 7 + coord.z * 3) as u8;
    Bytes::from(
        (0..voxels)
            .map(|i| seed.wrapping_add((i % 251) as u8))
            .collect::<Vec<u8>>(),
    )
}

/// Label block with labels unique to block and voxel
pub fn label_pattern(coord: BlockCoord, block_size: usize, salt: u64) -> Bytes {
    let voxels = block_size * block_size * block_size;
    let base = ((coord.x as u64) << 40) ^ ((coord.y as u64) << 24) ^ ((coord.z as u64) << 12);
    let labels: Vec<u64> = (0..voxels as u64).map(|i| base + i + salt).collect();
    Bytes::copy_from_slice(bytemuck::cast_slice(&labels))
}

/// Store holding the sample body's coverage, grayscale and labels
pub fn seeded_store(block_size: usize) -> MemoryStore {
    let store = MemoryStore::new(block_size);
    store.insert_body(LABELVOL, BODY, sample_body());
    for coord in sample_body() {
        store.insert_gray_block(GRAY, coord, gray_pattern(coord, block_size));
        store.insert_label_block(LABELS, coord, label_pattern(coord, block_size, 0));
    }
    store
}
