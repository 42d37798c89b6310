use bytes::Bytes;

use super::{scatter_run, span_slots};
use crate::constants::element;
use crate::error::FetchResult;
use crate::spans::BlockSpan;
use crate::volume::VolumeClient;

/// Fetches 64-bit label blocks for a slice of spans
pub struct LabelBlockFetcher<'a, C> {
    client: C,
    instance: &'a str,
    block_size: usize,
}

impl<'a, C: VolumeClient> LabelBlockFetcher<'a, C> {
    pub fn new(client: C, instance: &'a str, block_size: usize) -> Self {
        Self {
            client,
            instance,
            block_size,
        }
    }

    /// Fetch every span in `spans` into `slots` (first slot is block `base`)
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
            "Fetching {} label blocks at {:?} from '{}'",
            span.run_length,
            span.start(),
            self.instance
        );
        let volume = self.client.get_labels3d(
            self.instance,
            span.volume_dims(self.block_size),
            span.voxel_offset(self.block_size),
        )?;
        scatter_run(
            volume.into_bytes(),
            "get_labels3d",
            self.instance,
            self.block_size,
            element::LABEL_WIDTH,
            out,
        )
    }
}
