use crate::foundation::core::FrameIndex;
use crate::invoke::render::RenderError;

/// Terminal state of one frame job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Rendered,
    /// Output already existed; the renderer was not invoked.
    Skipped,
    Failed,
    /// The run was cancelled before this job started.
    Cancelled,
}

/// Outcome of one frame job. Created once by the worker that resolved it.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct JobResult {
    pub index: FrameIndex,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RenderError>,
    /// Renderer invocations made for this job (0 for skipped/cancelled).
    pub attempts: u32,
    pub elapsed_ms: u64,
}

impl JobResult {
    pub(crate) fn without_render(index: FrameIndex, status: JobStatus) -> Self {
        Self {
            index,
            status,
            error: None,
            attempts: 0,
            elapsed_ms: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StatusCounts {
    pub rendered: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: usize,
}

/// Aggregate outcome of a dispatch: one result per job, in frame-index order.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DispatchReport {
    pub results: Vec<JobResult>,
}

impl DispatchReport {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn counts(&self) -> StatusCounts {
        let mut c = StatusCounts::default();
        for r in &self.results {
            match r.status {
                JobStatus::Rendered => c.rendered += 1,
                JobStatus::Skipped => c.skipped += 1,
                JobStatus::Failed => c.failed += 1,
                JobStatus::Cancelled => c.cancelled += 1,
            }
        }
        c
    }

    pub fn failed(&self) -> impl Iterator<Item = &JobResult> {
        self.results
            .iter()
            .filter(|r| r.status == JobStatus::Failed)
    }

    pub fn failed_indices(&self) -> Vec<u64> {
        self.failed().map(|r| r.index.0).collect()
    }

    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }

    pub fn was_cancelled(&self) -> bool {
        self.results
            .iter()
            .any(|r| r.status == JobStatus::Cancelled)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/dispatch/result.rs"]
mod tests;
