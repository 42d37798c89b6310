//! Per-call fork-join worker pool
//!
//! A pool is built for one batch, runs one job per work range and is torn
//! down when the call returns. All jobs are joined before any outcome is
//! inspected: a failing worker does not cancel its siblings, and its error
//! is reported only after every worker has stopped touching the output.

use crossbeam_channel::unbounded;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{invariant_violation, FetchError, FetchResult};
use crate::partition::WorkRange;

/// Outcome of one worker
#[derive(Debug)]
pub struct WorkerReport {
    pub worker: usize,
    /// Units assigned to the worker
    pub assigned: usize,
    /// Units the worker completed
    pub completed: usize,
    pub result: FetchResult<()>,
}

/// Fixed-size pool living for a single batch
pub struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    pub fn new(workers: usize, thread_prefix: &str) -> FetchResult<Self> {
        let workers = workers.max(1);
        let prefix = thread_prefix.to_string();
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(move |idx| format!("{}-{}", prefix, idx))
            .build()
            .map_err(|e| FetchError::WorkerPool {
                message: format!("failed to create {} workers: {}", workers, e),
            })?;
        Ok(Self { pool })
    }

    /// Run one job per range and wait for all of them
    ///
    /// A job returns how many of its units it completed. Jobs borrow their
    /// inputs and outputs for `'scope`; callers hand each job disjoint
    /// output slices so jobs never alias.
    pub fn run<'scope, F>(&self, jobs: Vec<(WorkRange, F)>) -> Vec<WorkerReport>
    where
        F: FnOnce() -> (usize, FetchResult<()>) + Send + 'scope,
    {
        let (sender, receiver) = unbounded();

        self.pool.scope(|scope| {
            for (range, job) in jobs {
                let sender = sender.clone();
                scope.spawn(move |_| {
                    log::debug!(
                        "Worker {} starting units {}..{}",
                        range.worker,
                        range.start,
                        range.end()
                    );
                    let (completed, result) = job();
                    if let Err(e) = &result {
                        log::warn!(
                            "Worker {} failed after {} units: {}",
                            range.worker,
                            completed,
                            e
                        );
                    }
                    let _ = sender.send(WorkerReport {
                        worker: range.worker,
                        assigned: range.count,
                        completed,
                        result,
                    });
                });
            }
        });
        drop(sender);

        let mut reports: Vec<WorkerReport> = receiver.try_iter().collect();
        reports.sort_by_key(|report| report.worker);
        reports
    }
}

/// Fold worker reports into the call's outcome
///
/// Returns the lowest-numbered worker's error if any failed, otherwise
/// checks every worker reported and the completed unit count matches.
pub fn settle(
    reports: Vec<WorkerReport>,
    expected_workers: usize,
    total_units: usize,
) -> FetchResult<()> {
    let reported = reports.len();
    let mut completed = 0;
    let mut assigned = 0;
    let mut first_error = None;

    for report in reports {
        completed += report.completed;
        assigned += report.assigned;
        if let Err(e) = report.result {
            first_error.get_or_insert(e);
        }
    }

    if let Some(e) = first_error {
        return Err(e);
    }
    if reported != expected_workers {
        return Err(invariant_violation(format!(
            "{} of {} workers reported",
            reported, expected_workers
        )));
    }
    if assigned != total_units || completed != total_units {
        return Err(invariant_violation(format!(
            "workers were assigned {} and completed {} of {} units",
            assigned, completed, total_units
        )));
    }
    Ok(())
}
