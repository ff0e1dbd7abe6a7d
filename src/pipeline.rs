use anyhow::Context as _;

use crate::{
    config::{FailurePolicy, ZoomConfig},
    dispatch::{
        cancel::CancelToken,
        dispatcher::{JobDispatcher, ResumeCheck},
        progress::{DispatchProgress, ProgressObserver},
        result::DispatchReport,
    },
    foundation::error::{ZoomError, ZoomResult},
    invoke::{
        encode::{EncodeRequest, VideoEncoder},
        render::RenderInvoker,
    },
    plan::builder::FramePlan,
};

/// Outcome of a full run that reached the encoder.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct RunReport {
    pub frames: DispatchReport,
    /// Indices that failed to render but were left out of a best-effort video.
    pub failed: Vec<u64>,
}

/// A run that stopped with an error, with the per-frame results gathered so far.
#[derive(thiserror::Error, Debug)]
#[error("{error}")]
pub struct RunError {
    /// Present whenever dispatch finished, so failed frames and their errors stay inspectable.
    pub frames: Option<DispatchReport>,
    pub error: ZoomError,
}

impl From<RunError> for ZoomError {
    fn from(e: RunError) -> Self {
        e.error
    }
}

/// Plan → dispatch → encode, for one immutable configuration.
///
/// Parameter errors surface before anything is dispatched. Per-frame failures are collected
/// in the [`DispatchReport`]; the encoder runs exactly once, after every job is resolved.
pub struct ZoomPipeline {
    cfg: ZoomConfig,
    plan: FramePlan,
    cancel: CancelToken,
}

impl ZoomPipeline {
    pub fn new(cfg: ZoomConfig) -> ZoomResult<Self> {
        let plan = cfg.plan()?;
        Ok(Self {
            cfg,
            plan,
            cancel: CancelToken::new(),
        })
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &ZoomConfig {
        &self.cfg
    }

    pub fn plan(&self) -> &FramePlan {
        &self.plan
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Render every frame that is not already done. Never encodes.
    pub fn render_frames(
        &self,
        renderer: &dyn RenderInvoker,
        done: &dyn ResumeCheck,
        observer: &dyn ProgressObserver,
    ) -> ZoomResult<DispatchReport> {
        let dir = &self.cfg.naming.dir;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create frames directory '{}'", dir.display()))?;

        tracing::info!(
            frames = self.plan.len(),
            workers = self.cfg.workers,
            policy = ?self.cfg.policy,
            "starting zoom render"
        );

        let dispatcher = JobDispatcher::new(self.cfg.workers)?
            .with_retries(self.cfg.retries)
            .with_cancel(self.cancel.clone());
        let progress = DispatchProgress::new(self.plan.len());
        dispatcher.dispatch(self.plan.jobs(), done, renderer, &progress, observer)
    }

    /// Apply the failure policy to a finished dispatch and, if allowed, encode the video.
    ///
    /// On failure the dispatch report is handed back inside the [`RunError`].
    pub fn encode(
        &self,
        frames: DispatchReport,
        encoder: &dyn VideoEncoder,
    ) -> Result<RunReport, RunError> {
        match self.try_encode(&frames, encoder) {
            Ok(failed) => Ok(RunReport { frames, failed }),
            Err(error) => Err(RunError {
                frames: Some(frames),
                error,
            }),
        }
    }

    /// Full run: [`ZoomPipeline::render_frames`] then [`ZoomPipeline::encode`].
    pub fn run(
        &self,
        renderer: &dyn RenderInvoker,
        encoder: &dyn VideoEncoder,
        done: &dyn ResumeCheck,
        observer: &dyn ProgressObserver,
    ) -> Result<RunReport, RunError> {
        let frames = self
            .render_frames(renderer, done, observer)
            .map_err(|error| RunError {
                frames: None,
                error,
            })?;
        self.encode(frames, encoder)
    }

    fn try_encode(
        &self,
        frames: &DispatchReport,
        encoder: &dyn VideoEncoder,
    ) -> ZoomResult<Vec<u64>> {
        if frames.was_cancelled() || self.cancel.is_cancelled() {
            tracing::warn!("run cancelled, not encoding");
            return Err(ZoomError::Cancelled);
        }

        let failed = frames.failed_indices();
        if !failed.is_empty() {
            match self.cfg.failure_policy {
                FailurePolicy::AbortOnFailure => {
                    tracing::error!(?failed, "frames failed, not encoding");
                    return Err(ZoomError::FramesFailed { failed });
                }
                FailurePolicy::BestEffort => {
                    tracing::warn!(?failed, "frames failed, encoding remaining frames");
                }
            }
        }

        let req = EncodeRequest {
            fps: self.cfg.timing.fps,
            frames_glob: self.cfg.naming.glob_pattern(),
        };
        encoder.encode(&req)?;
        Ok(failed)
    }
}
