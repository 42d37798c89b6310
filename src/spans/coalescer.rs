use serde::{Deserialize, Serialize};

use super::{BlockSpan, SpanSet};
use crate::error::{body_not_found, FetchResult};
use crate::volume::{BlockCoord, VolumeClient};

/// How block coordinates are grouped into requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Coalescing {
    /// Merge x-contiguous blocks sharing y and z into one span
    #[default]
    #[serde(rename = "greedy")]
    Greedy,
    /// One request per block
    #[serde(rename = "none", alias = "per_block")]
    PerBlock,
}

/// Turns a sorted coverage list into the fewest spans
#[derive(Debug, Clone, Copy)]
pub struct SpanCoalescer {
    mode: Coalescing,
    max_run_length: usize,
}

impl SpanCoalescer {
    pub fn new(mode: Coalescing, max_run_length: usize) -> Self {
        Self {
            mode,
            max_run_length: max_run_length.max(1),
        }
    }

    /// Coalesce `coords`, which must be sorted by z, then y, then x
    pub fn coalesce(&self, coords: &[BlockCoord]) -> SpanSet {
        let mut spans = Vec::new();
        let Some((first, rest)) = coords.split_first() else {
            return SpanSet::from_validated(spans);
        };

        let mut current = BlockSpan::new(*first, 1, 0);
        for coord in rest {
            let extends = self.mode == Coalescing::Greedy
                && current.run_length < self.max_run_length
                && coord.y == current.y
                && coord.z == current.z
                && coord.x == current.xmax() + 1;

            if extends {
                current.run_length += 1;
            } else {
                let next_offset = current.output_offset + current.run_length;
                spans.push(current);
                current = BlockSpan::new(*coord, 1, next_offset);
            }
        }
        spans.push(current);

        SpanSet::from_validated(spans)
    }

    /// Look up a body's coverage and coalesce it
    ///
    /// Fails with `NotFound` when the body covers no blocks; no span is
    /// built in that case.
    pub fn spans_for_body<C: VolumeClient>(
        &self,
        client: &mut C,
        labelvol: &str,
        body_id: u64,
    ) -> FetchResult<SpanSet> {
        let coords = client.coarse_body(labelvol, body_id)?;
        if coords.is_empty() {
            return Err(body_not_found(body_id, labelvol));
        }
        let spans = self.coalesce(&coords);
        log::debug!(
            "Body {} covers {} blocks in {} spans ({:?})",
            body_id,
            coords.len(),
            spans.request_count(),
            self.mode
        );
        Ok(spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::MemoryStore;

    fn coords(list: &[(i32, i32, i32)]) -> Vec<BlockCoord> {
        list.iter().map(|&(x, y, z)| BlockCoord::new(x, y, z)).collect()
    }

    #[test]
    fn test_greedy_merges_contiguous_x() {
        let input = coords(&[(0, 0, 0), (1, 0, 0), (2, 0, 0), (5, 0, 0)]);
        let spans = SpanCoalescer::new(Coalescing::Greedy, 4096).coalesce(&input);
        assert_eq!(
            spans.as_slice(),
            &[
                BlockSpan { xmin: 0, y: 0, z: 0, run_length: 3, output_offset: 0 },
                BlockSpan { xmin: 5, y: 0, z: 0, run_length: 1, output_offset: 3 },
            ]
        );
        assert_eq!(spans.request_count(), 2);
    }

    #[test]
    fn test_breaks_on_row_and_slice_change() {
        let input = coords(&[(0, 0, 0), (1, 0, 0), (2, 1, 0), (3, 1, 0), (4, 1, 1)]);
        let spans = SpanCoalescer::new(Coalescing::Greedy, 4096).coalesce(&input);
        let runs: Vec<_> = spans.iter().map(|s| (s.xmin, s.y, s.z, s.run_length)).collect();
        assert_eq!(runs, vec![(0, 0, 0, 2), (2, 1, 0, 2), (4, 1, 1, 1)]);
    }

    #[test]
    fn test_same_x_next_row_not_merged() {
        // x + 1 on a different row must still split
        let input = coords(&[(0, 0, 0), (1, 1, 0)]);
        let spans = SpanCoalescer::new(Coalescing::Greedy, 4096).coalesce(&input);
        assert_eq!(spans.len(), 2);
    }

    #[test]
    fn test_per_block_mode() {
        let input = coords(&[(0, 0, 0), (1, 0, 0), (2, 0, 0)]);
        let spans = SpanCoalescer::new(Coalescing::PerBlock, 4096).coalesce(&input);
        assert_eq!(spans.len(), 3);
        assert!(spans.iter().all(|s| s.run_length == 1));
        let offsets: Vec<_> = spans.iter().map(|s| s.output_offset).collect();
        assert_eq!(offsets, vec![0, 1, 2]);
    }

    #[test]
    fn test_max_run_length_splits_long_rows() {
        let input: Vec<_> = (0..10).map(|x| BlockCoord::new(x, 0, 0)).collect();
        let spans = SpanCoalescer::new(Coalescing::Greedy, 4).coalesce(&input);
        let runs: Vec<_> = spans.iter().map(|s| (s.xmin, s.run_length, s.output_offset)).collect();
        assert_eq!(runs, vec![(0, 4, 0), (4, 4, 4), (8, 2, 8)]);
    }

    #[test]
    fn test_expand_reproduces_coverage() {
        let input = coords(&[
            (-3, 0, 0), (-2, 0, 0), (0, 0, 0), (1, 0, 0),
            (7, 2, 0), (8, 2, 0), (9, 2, 0),
            (0, 0, 3), (2, 0, 3), (3, 0, 3),
        ]);
        for (mode, limit) in [
            (Coalescing::Greedy, 4096),
            (Coalescing::Greedy, 2),
            (Coalescing::PerBlock, 4096),
        ] {
            let spans = SpanCoalescer::new(mode, limit).coalesce(&input);
            assert_eq!(spans.total_blocks(), input.len());
            assert_eq!(spans.expand(), input);
            assert!(spans.validate().is_ok());
        }
    }

    #[test]
    fn test_single_block() {
        let spans = SpanCoalescer::new(Coalescing::Greedy, 4096).coalesce(&coords(&[(4, 5, 6)]));
        assert_eq!(spans.as_slice(), &[BlockSpan::new(BlockCoord::new(4, 5, 6), 1, 0)]);
    }

    #[test]
    fn test_empty_body_is_not_found() {
        let mut store = MemoryStore::new(32);
        let err = SpanCoalescer::new(Coalescing::Greedy, 4096)
            .spans_for_body(&mut store, "bodies", 42)
            .unwrap_err();
        assert!(matches!(err, crate::FetchError::NotFound { body_id: 42, .. }));
    }

    #[test]
    fn test_coalescing_serde_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: Coalescing,
        }
        let greedy: Wrapper = toml::from_str("mode = \"greedy\"").unwrap();
        let none: Wrapper = toml::from_str("mode = \"none\"").unwrap();
        assert_eq!(greedy.mode, Coalescing::Greedy);
        assert_eq!(none.mode, Coalescing::PerBlock);
    }
}
