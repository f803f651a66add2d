//! Parallel batch execution.
//!
//! Images are independent, so a fixed pool of scoped worker threads pulls
//! job indices from a shared atomic counter until the queue is drained or
//! the batch is cancelled. A failed image is recorded and never stops its
//! siblings.
//!
//! # Example
//!
//! ```ignore
//! use pixeldown::batch::{plan_jobs, ParallelBatch};
//!
//! let jobs = plan_jobs(&inputs, Some(out_dir), &config);
//! let result = ParallelBatch::new(&config).with_jobs(4).run(&jobs);
//! println!("{}", result.summary());
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use super::{BatchJob, BatchResult, ImageOutcome};
use crate::config::DownscaleConfig;
use crate::pipeline::process_file;

/// Default number of parallel jobs (uses available parallelism).
fn default_jobs() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

const WORKER_PANICKED: &str = "worker panicked while processing this image";

type ProgressFn<'a> = dyn Fn(&ImageOutcome) + Send + Sync + 'a;

/// Parallel batch executor.
pub struct ParallelBatch<'a> {
    /// Shared, read-only configuration
    config: &'a DownscaleConfig,
    /// Number of worker threads
    jobs: usize,
    /// Set to stop dispatching new images
    cancel: Arc<AtomicBool>,
    /// Called once per finished image, from the worker that processed it
    on_complete: Option<Box<ProgressFn<'a>>>,
}

impl<'a> ParallelBatch<'a> {
    /// Create a new batch executor.
    pub fn new(config: &'a DownscaleConfig) -> Self {
        Self { config, jobs: default_jobs(), cancel: Arc::new(AtomicBool::new(false)), on_complete: None }
    }

    /// Set the number of parallel jobs.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Share an external cancellation flag.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Report each finished image.
    pub fn with_progress(mut self, callback: impl Fn(&ImageOutcome) + Send + Sync + 'a) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Get the number of parallel jobs.
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Handle that cancels the batch when set to `true`.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Process every job, returning outcomes in job order.
    ///
    /// Once cancelled, no new image is started; images already in flight
    /// finish and are reported. An image whose worker panicked is reported
    /// as failed, not cancelled.
    pub fn run(&self, jobs: &[BatchJob]) -> BatchResult {
        let start = Instant::now();

        let (mut outcomes, claimed) = if self.jobs == 1 || jobs.len() <= 1 {
            self.run_sequential(jobs)
        } else {
            self.run_parallel(jobs)
        };

        let mut reported = vec![false; claimed];
        for (idx, _) in &outcomes {
            reported[*idx] = true;
        }
        for (idx, _) in reported.iter().enumerate().filter(|(_, done)| !**done) {
            let lost = ImageOutcome::failed(jobs[idx].input.clone(), WORKER_PANICKED.to_string(), Duration::ZERO);
            outcomes.push((idx, lost));
        }

        // Sort by original index to keep the output deterministic
        outcomes.sort_by_key(|(idx, _)| *idx);

        let mut result = BatchResult::new();
        result.cancelled = jobs.len() - claimed;
        for (_, outcome) in outcomes {
            result.add_outcome(outcome);
        }
        result.total_duration = start.elapsed();

        log::info!(
            "Batch done: {} succeeded, {} failed, {} cancelled in {:?}",
            result.success_count(),
            result.failed_count(),
            result.cancelled,
            result.total_duration
        );
        result
    }

    /// Returns the outcomes and the number of jobs started.
    fn run_sequential(&self, jobs: &[BatchJob]) -> (Vec<(usize, ImageOutcome)>, usize) {
        let mut outcomes = Vec::with_capacity(jobs.len());
        for (idx, job) in jobs.iter().enumerate() {
            if self.cancel.load(Ordering::SeqCst) {
                break;
            }
            outcomes.push((idx, self.execute(job)));
        }
        let started = outcomes.len();
        (outcomes, started)
    }

    /// Returns the outcomes and the number of jobs claimed by a worker.
    ///
    /// Outcomes go through a channel as soon as they finish, so a worker
    /// that panics keeps everything it completed before the panic.
    fn run_parallel(&self, jobs: &[BatchJob]) -> (Vec<(usize, ImageOutcome)>, usize) {
        let next_idx = AtomicUsize::new(0);
        let num_workers = self.jobs.min(jobs.len());
        let (tx, rx) = mpsc::channel();

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..num_workers)
                .map(|_| {
                    let next_idx = &next_idx;
                    let tx = tx.clone();
                    s.spawn(move || loop {
                        if self.cancel.load(Ordering::SeqCst) {
                            break;
                        }

                        let idx = next_idx.fetch_add(1, Ordering::SeqCst);
                        if idx >= jobs.len() {
                            break;
                        }

                        if tx.send((idx, self.execute(&jobs[idx]))).is_err() {
                            break;
                        }
                    })
                })
                .collect();
            drop(tx);

            for handle in handles {
                if handle.join().is_err() {
                    log::error!("A batch worker panicked; its current image is reported as failed");
                }
            }
        });

        let claimed = next_idx.load(Ordering::SeqCst).min(jobs.len());
        (rx.into_iter().collect(), claimed)
    }

    /// Process one job, turning any error into a failed outcome.
    fn execute(&self, job: &BatchJob) -> ImageOutcome {
        let start = Instant::now();
        let outcome = match process_file(&job.input, &job.output, self.config) {
            Ok(record) => ImageOutcome::success(job.input.clone(), record, start.elapsed()),
            Err(e) => {
                log::warn!("{}", e);
                ImageOutcome::failed(job.input.clone(), e.to_string(), start.elapsed())
            }
        };

        if let Some(callback) = &self.on_complete {
            callback(&outcome);
        }
        outcome
    }
}
