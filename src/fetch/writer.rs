use bytes::Bytes;

use crate::constants::element;
use crate::error::{invariant_violation, FetchResult};
use crate::reshape::interleave_run;
use crate::spans::BlockSpan;
use crate::volume::{LabelVolume, VolumeClient};

/// Writes label blocks back to the store, one request per span
pub struct LabelBlockWriter<'a, C> {
    client: C,
    instance: &'a str,
    block_size: usize,
}

impl<'a, C: VolumeClient> LabelBlockWriter<'a, C> {
    pub fn new(client: C, instance: &'a str, block_size: usize) -> Self {
        Self {
            client,
            instance,
            block_size,
        }
    }

    /// Write every span in `spans`, reading its blocks from `blocks`
    /// (indexed by `output_offset`)
    pub fn write_spans(
        &mut self,
        spans: &[BlockSpan],
        blocks: &[Bytes],
    ) -> (usize, FetchResult<()>) {
        for (done, span) in spans.iter().enumerate() {
            if let Err(e) = self.write_span(span, blocks) {
                return (done, Err(e));
            }
        }
        (spans.len(), Ok(()))
    }

    fn write_span(&mut self, span: &BlockSpan, blocks: &[Bytes]) -> FetchResult<()> {
        let sources = blocks.get(span.block_range()).ok_or_else(|| {
            invariant_violation(format!(
                "span blocks {:?} outside block array of {}",
                span.block_range(),
                blocks.len()
            ))
        })?;

        let dims = span.volume_dims(self.block_size);
        let volume = if let [single] = sources {
            LabelVolume::from_bytes(dims, single.clone())?
        } else {
            let run = interleave_run(sources, self.block_size, element::LABEL_WIDTH)?;
            LabelVolume::from_bytes(dims, Bytes::from(run))?
        };

        log::trace!(
            "Writing {} label blocks at {:?} to '{}'",
            span.run_length,
            span.start(),
            self.instance
        );
        self.client
            .put_labels3d(self.instance, &volume, span.voxel_offset(self.block_size))
    }
}
