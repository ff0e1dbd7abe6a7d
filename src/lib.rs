//! zoomreel plans and dispatches fractal zoom animations.
//!
//! A run is fixed up front and then executed:
//!
//! - Interpolate a viewport and an iteration budget for every frame ([`ViewportPath`],
//!   [`IterationBudget`])
//! - Build the ordered [`FramePlan`] of [`FrameJob`]s
//! - Dispatch the jobs to an external renderer on a bounded worker pool, skipping frames
//!   whose output already exists ([`JobDispatcher`])
//! - Encode the frames into a video once every job is resolved ([`FfmpegEncoder`])
#![forbid(unsafe_code)]

mod foundation;

pub mod config;
pub mod dispatch;
pub mod invoke;
pub mod pipeline;
pub mod plan;
pub mod trajectory;

pub use crate::foundation::core::{FrameIndex, Interval, Resolution, Viewport};
pub use crate::foundation::error::{ZoomError, ZoomResult};

pub use crate::config::{FailurePolicy, IterationRamp, RendererConfig, Timing, ZoomConfig};
pub use crate::dispatch::cancel::CancelToken;
pub use crate::dispatch::dispatcher::{JobDispatcher, OutputFileExists, ResumeCheck};
pub use crate::dispatch::progress::{DispatchProgress, NoProgress, ProgressObserver};
pub use crate::dispatch::result::{DispatchReport, JobResult, JobStatus, StatusCounts};
pub use crate::invoke::encode::{EncodeConfig, EncodeRequest, FfmpegEncoder, VideoEncoder};
pub use crate::invoke::render::{ProcessRenderer, RenderError, RenderInvoker};
pub use crate::pipeline::{RunError, RunReport, ZoomPipeline};
pub use crate::plan::builder::FramePlan;
pub use crate::plan::job::{FrameJob, FrameNaming};
pub use crate::trajectory::budget::IterationBudget;
pub use crate::trajectory::path::{ViewportIter, ViewportPath};
pub use crate::trajectory::policy::{InterpolationPolicy, Pacing};
