use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{geometry, requests};
use crate::error::{invalid_config, FetchResult};
use crate::spans::Coalescing;

/// Transfer configuration
///
/// Block size and element widths are shared with the store; the remaining
/// fields shape how requests are batched and how many workers run them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Block edge length in voxels
    pub block_size: usize,
    /// Longest span a single request may cover, in blocks
    pub max_blocks_per_request: usize,
    /// Requested worker count (clamped per call to the unit count)
    pub worker_count: usize,
    /// How block coordinates are grouped into requests
    pub coalescing: Coalescing,
    /// Ask the store for block-shaped buffers instead of a bounding volume
    pub block_native: bool,
    /// Prefix for worker thread names
    pub thread_name_prefix: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            block_size: geometry::DEFAULT_BLOCK_SIZE,
            max_blocks_per_request: requests::MAX_BLOCKS_PER_REQUEST,
            worker_count: num_cpus::get().max(1),
            coalescing: Coalescing::Greedy,
            block_native: false,
            thread_name_prefix: requests::DEFAULT_THREAD_PREFIX.to_string(),
        }
    }
}

impl FetchConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> FetchResult<Self> {
        let config: FetchConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> FetchResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("Loaded fetch config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn with_workers(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_coalescing(mut self, coalescing: Coalescing) -> Self {
        self.coalescing = coalescing;
        self
    }

    pub fn with_block_native(mut self, block_native: bool) -> Self {
        self.block_native = block_native;
        self
    }

    pub fn with_max_blocks_per_request(mut self, max_blocks: usize) -> Self {
        self.max_blocks_per_request = max_blocks;
        self
    }

    /// Reject values the transfer layer cannot work with
    pub fn validate(&self) -> FetchResult<()> {
        if self.block_size == 0 {
            return Err(invalid_config("block_size", "must be at least 1"));
        }
        if self.max_blocks_per_request == 0 {
            return Err(invalid_config("max_blocks_per_request", "must be at least 1"));
        }
        if self.thread_name_prefix.is_empty() {
            return Err(invalid_config("thread_name_prefix", "must not be empty"));
        }
        Ok(())
    }

    /// Voxels in one block
    pub fn block_voxels(&self) -> usize {
        self.block_size * self.block_size * self.block_size
    }
}
