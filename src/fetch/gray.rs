use bytes::Bytes;

use super::{scatter_run, span_slots};
use crate::constants::element;
use crate::error::{remote_call_failed, FetchResult};
use crate::spans::BlockSpan;
use crate::volume::VolumeClient;

/// Fetches grayscale blocks for a slice of spans
pub struct GrayBlockFetcher<'a, C> {
    client: C,
    instance: &'a str,
    block_size: usize,
    block_native: bool,
}

impl<'a, C: VolumeClient> GrayBlockFetcher<'a, C> {
    pub fn new(client: C, instance: &'a str, block_size: usize, block_native: bool) -> Self {
        Self {
            client,
            instance,
            block_size,
            block_native,
        }
    }

    /// Fetch every span in `spans` into `slots`, whose first element is
    /// block `base` of the output array
    ///
    /// Returns the number of spans completed alongside the outcome.
    pub fn fetch_spans(
        &mut self,
        spans: &[BlockSpan],
        slots: &mut [Option<Bytes>],
        base: usize,
    ) -> (usize, FetchResult<()>) {
        for (done, span) in spans.iter().enumerate() {
            let result = span_slots(slots, base, span).and_then(|out| self.fetch_span(span, out));
            if let Err(e) = result {
                return (done, Err(e));
            }
        }
        (spans.len(), Ok(()))
    }

    fn fetch_span(&mut self, span: &BlockSpan, out: &mut [Option<Bytes>]) -> FetchResult<()> {
        log::trace!(
            "Fetching {} gray blocks at {:?} from '{}'",
            span.run_length,
            span.start(),
            self.instance
        );

        if self.block_native {
            let blocks = self
                .client
                .get_grayblocks(self.instance, span.start(), span.run_length)?;
            let block_bytes =
                self.block_size * self.block_size * self.block_size * element::GRAY_WIDTH;
            if blocks.len() != span.run_length || blocks.iter().any(|b| b.len() != block_bytes) {
                return Err(remote_call_failed(
                    "get_grayblocks",
                    self.instance,
                    format!(
                        "expected {} blocks of {} bytes, got {}",
                        span.run_length,
                        block_bytes,
                        blocks.len()
                    ),
                ));
            }
            for (slot, block) in out.iter_mut().zip(blocks) {
                *slot = Some(block);
            }
            return Ok(());
        }

        let volume = self.client.get_gray3d(
            self.instance,
            span.volume_dims(self.block_size),
            span.voxel_offset(self.block_size),
        )?;
        scatter_run(
            volume.into_bytes(),
            "get_gray3d",
            self.instance,
            self.block_size,
            element::GRAY_WIDTH,
            out,
        )
    }
}
