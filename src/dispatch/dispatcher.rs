use std::{panic::AssertUnwindSafe, time::Instant};

use rayon::prelude::*;

use crate::{
    dispatch::{
        cancel::CancelToken,
        progress::{DispatchProgress, ProgressObserver},
        result::{DispatchReport, JobResult, JobStatus},
    },
    foundation::error::{ZoomError, ZoomResult},
    invoke::render::{RenderError, RenderInvoker},
    plan::job::FrameJob,
};

/// Decides whether a job's output is already present and the job can be skipped.
///
/// This is advisory: two runs sharing an output directory can race.
pub trait ResumeCheck: Sync {
    fn is_done(&self, job: &FrameJob) -> bool;
}

/// Treats a job as done when its output path is an existing file.
#[derive(Clone, Copy, Debug, Default)]
pub struct OutputFileExists;

impl ResumeCheck for OutputFileExists {
    fn is_done(&self, job: &FrameJob) -> bool {
        job.output.is_file()
    }
}

impl<F> ResumeCheck for F
where
    F: Fn(&FrameJob) -> bool + Sync,
{
    fn is_done(&self, job: &FrameJob) -> bool {
        self(job)
    }
}

/// Runs frame jobs on a fixed-size worker pool.
///
/// The pool size is a manual admission-control knob: each render is typically
/// multi-threaded itself, so it is never derived from the core count.
#[derive(Clone, Debug)]
pub struct JobDispatcher {
    workers: usize,
    retries: u32,
    cancel: CancelToken,
}

impl JobDispatcher {
    pub fn new(workers: usize) -> ZoomResult<Self> {
        if workers == 0 {
            return Err(ZoomError::invalid("worker count must be >= 1"));
        }
        Ok(Self {
            workers,
            retries: 0,
            cancel: CancelToken::new(),
        })
    }

    /// Extra render attempts per failing job. Defaults to 0.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Resolve every job to a terminal status and return the results in index order.
    ///
    /// Render failures are recorded, never propagated; the error path is reserved for
    /// failing to set up the worker pool.
    #[tracing::instrument(skip_all, fields(jobs = jobs.len(), workers = self.workers))]
    pub fn dispatch(
        &self,
        jobs: &[FrameJob],
        done: &dyn ResumeCheck,
        renderer: &dyn RenderInvoker,
        progress: &DispatchProgress,
        observer: &dyn ProgressObserver,
    ) -> ZoomResult<DispatchReport> {
        let pool = build_thread_pool(self.workers)?;
        tracing::info!("dispatching frame jobs");

        let results: Vec<JobResult> = pool.install(|| {
            jobs.par_iter()
                .map(|job| {
                    let result = self.run_one(job, done, renderer);
                    let completed = progress.advance();
                    observer.job_finished(&result, completed, progress.total());
                    result
                })
                .collect()
        });

        let report = DispatchReport { results };
        let c = report.counts();
        tracing::info!(
            rendered = c.rendered,
            skipped = c.skipped,
            failed = c.failed,
            cancelled = c.cancelled,
            "dispatch finished"
        );
        Ok(report)
    }

    fn run_one(
        &self,
        job: &FrameJob,
        done: &dyn ResumeCheck,
        renderer: &dyn RenderInvoker,
    ) -> JobResult {
        if self.cancel.is_cancelled() {
            return JobResult::without_render(job.index, JobStatus::Cancelled);
        }
        if done.is_done(job) {
            tracing::debug!(frame = job.index.0, "output exists, skipping");
            return JobResult::without_render(job.index, JobStatus::Skipped);
        }

        let started = Instant::now();
        let mut attempts = 0u32;
        let outcome = loop {
            attempts += 1;
            match render_guarded(renderer, job) {
                Ok(()) => break Ok(()),
                Err(e) if attempts <= self.retries && !self.cancel.is_cancelled() => {
                    tracing::debug!(
                        frame = job.index.0,
                        attempt = attempts,
                        error = %e,
                        "retrying"
                    );
                }
                Err(e) => break Err(e),
            }
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(()) => {
                tracing::debug!(frame = job.index.0, elapsed_ms, "rendered");
                JobResult {
                    index: job.index,
                    status: JobStatus::Rendered,
                    error: None,
                    attempts,
                    elapsed_ms,
                }
            }
            Err(e) => {
                tracing::warn!(frame = job.index.0, attempts, error = %e, "frame failed");
                JobResult {
                    index: job.index,
                    status: JobStatus::Failed,
                    error: Some(e),
                    attempts,
                    elapsed_ms,
                }
            }
        }
    }
}

/// Run one render, turning a panicking invoker into a per-frame failure.
fn render_guarded(renderer: &dyn RenderInvoker, job: &FrameJob) -> Result<(), RenderError> {
    match std::panic::catch_unwind(AssertUnwindSafe(|| renderer.render(job))) {
        Ok(outcome) => outcome,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_string());
            Err(RenderError::Other {
                message: format!("renderer panicked: {message}"),
            })
        }
    }
}

fn build_thread_pool(threads: usize) -> ZoomResult<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("zoomreel-worker-{i}"))
        .build()
        .map_err(|e| ZoomError::Other(anyhow::anyhow!("failed to build worker pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/dispatch/dispatcher.rs"]
mod tests;
