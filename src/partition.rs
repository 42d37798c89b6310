//! Deterministic split of independent work units across workers
//!
//! Every worker gets a contiguous range; the last one also takes the
//! remainder. Contiguity is what lets each worker own a contiguous slice of
//! the output array, so no write needs synchronization.

use std::ops::Range;

use crate::error::{invariant_violation, FetchResult};

/// Units assigned to one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkRange {
    pub worker: usize,
    pub start: usize,
    pub count: usize,
}

impl WorkRange {
    pub fn end(&self) -> usize {
        self.start + self.count
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }
}

pub struct WorkPartitioner;

impl WorkPartitioner {
    /// Split `units` across at most `workers` ranges
    ///
    /// Yields `min(workers, units)` ranges; workers `0..n-1` get
    /// `units / n` units each and the last gets what remains. A worker
    /// count of zero is treated as one.
    pub fn partition(units: usize, workers: usize) -> Vec<WorkRange> {
        if units == 0 {
            return Vec::new();
        }
        let workers = workers.clamp(1, units);
        let base = units / workers;

        (0..workers)
            .map(|worker| {
                let start = worker * base;
                let count = if worker == workers - 1 { units - start } else { base };
                WorkRange { worker, start, count }
            })
            .collect()
    }

    /// Confirm `ranges` cover `[0, units)` exactly, in order
    pub fn check_coverage(ranges: &[WorkRange], units: usize) -> FetchResult<()> {
        let mut next = 0;
        for range in ranges {
            if range.start != next {
                return Err(invariant_violation(format!(
                    "worker {} starts at unit {} but {} units are assigned before it",
                    range.worker, range.start, next
                )));
            }
            next += range.count;
        }
        if next != units {
            return Err(invariant_violation(format!(
                "partition assigns {} units, expected {}",
                next, units
            )));
        }
        Ok(())
    }
}

/// Cut `items` into consecutive mutable slices of the given lengths
///
/// The lengths must sum to `items.len()`.
pub fn split_disjoint<'a, T>(
    mut items: &'a mut [T],
    lengths: impl IntoIterator<Item = usize>,
) -> FetchResult<Vec<&'a mut [T]>> {
    let mut parts = Vec::new();
    for length in lengths {
        if length > items.len() {
            return Err(invariant_violation(format!(
                "slice of {} requested with only {} items left",
                length,
                items.len()
            )));
        }
        let (head, tail) = std::mem::take(&mut items).split_at_mut(length);
        parts.push(head);
        items = tail;
    }
    if !items.is_empty() {
        return Err(invariant_violation(format!(
            "{} items left unassigned after split",
            items.len()
        )));
    }
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ten_units_three_workers() {
        let ranges = WorkPartitioner::partition(10, 3);
        let spans: Vec<_> = ranges.iter().map(|r| r.range()).collect();
        assert_eq!(spans, vec![0..3, 3..6, 6..10]);
        assert!(WorkPartitioner::check_coverage(&ranges, 10).is_ok());
    }

    #[test]
    fn test_counts_always_sum_to_units() {
        for units in 1..40 {
            for workers in 0..12 {
                let ranges = WorkPartitioner::partition(units, workers);
                assert_eq!(ranges.len(), workers.max(1).min(units));
                assert_eq!(ranges.iter().map(|r| r.count).sum::<usize>(), units);
                assert!(WorkPartitioner::check_coverage(&ranges, units).is_ok());
                assert!(ranges.iter().all(|r| r.count >= 1));
            }
        }
    }

    #[test]
    fn test_more_workers_than_units_clamps() {
        let ranges = WorkPartitioner::partition(1, 16);
        assert_eq!(ranges, vec![WorkRange { worker: 0, start: 0, count: 1 }]);
    }

    #[test]
    fn test_no_units_no_ranges() {
        assert!(WorkPartitioner::partition(0, 4).is_empty());
    }

    #[test]
    fn test_coverage_detects_gap() {
        let ranges = [
            WorkRange { worker: 0, start: 0, count: 2 },
            WorkRange { worker: 1, start: 3, count: 2 },
        ];
        assert!(WorkPartitioner::check_coverage(&ranges, 5).is_err());
        assert!(WorkPartitioner::check_coverage(&ranges[..1], 3).is_err());
    }

    #[test]
    fn test_split_disjoint() {
        let mut items: Vec<u32> = (0..6).collect();
        let parts = split_disjoint(&mut items, [1, 3, 2]).unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(&*parts[1], &[1, 2, 3]);
        for part in parts {
            part.iter_mut().for_each(|v| *v *= 10);
        }
        assert_eq!(items, vec![0, 10, 20, 30, 40, 50]);

        let mut short = [0u8; 2];
        assert!(split_disjoint(&mut short, [3]).is_err());
        assert!(split_disjoint(&mut short, [1]).is_err());
    }
}
