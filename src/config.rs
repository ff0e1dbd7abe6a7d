//! Run configuration: one immutable value passed into the pipeline.

use std::{path::Path, path::PathBuf, time::Duration};

use anyhow::Context as _;

use crate::{
    foundation::{
        core::{Resolution, Viewport},
        error::{ZoomError, ZoomResult},
    },
    invoke::encode::EncodeConfig,
    plan::{builder::FramePlan, job::FrameNaming},
    trajectory::{budget::IterationBudget, path::ViewportPath, policy::InterpolationPolicy},
};

/// Frame rate and clip length; the frame count is derived from both.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Timing {
    pub fps: u32,
    pub duration_secs: f64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            fps: 60,
            duration_secs: 15.0,
        }
    }
}

impl Timing {
    pub fn frame_count(self) -> u64 {
        (f64::from(self.fps) * self.duration_secs).round().max(0.0) as u64
    }
}

/// Iteration budget at the first frame and, optionally, at the last.
///
/// Without `end` every frame uses `start`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IterationRamp {
    pub start: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<u32>,
}

impl Default for IterationRamp {
    fn default() -> Self {
        Self {
            start: 2048,
            end: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub program: PathBuf,
    /// Arguments placed before the per-frame positional arguments.
    pub args: Vec<String>,
    pub timeout_secs: Option<u64>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("target/release/mandelbrot_cli"),
            args: Vec::new(),
            timeout_secs: None,
        }
    }
}

impl RendererConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// What to do with the video when some frames failed to render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Encode whatever frames exist and report the failed indices.
    #[default]
    BestEffort,
    /// Skip encoding when any frame failed.
    AbortOnFailure,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ZoomConfig {
    pub start: Viewport,
    pub target: Viewport,
    pub timing: Timing,
    pub policy: InterpolationPolicy,
    pub iterations: IterationRamp,
    pub resolution: Resolution,
    /// Concurrent renderer processes. Set by hand; renderers are multi-threaded themselves.
    pub workers: usize,
    pub retries: u32,
    pub naming: FrameNaming,
    pub renderer: RendererConfig,
    pub encoder: EncodeConfig,
    pub failure_policy: FailurePolicy,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            start: Viewport::from_bounds([-2.5, 1.0, 0.0, 1.0]),
            target: Viewport::from_bounds([
                -0.523110006711778,
                -0.523110006711743,
                0.680764072151876,
                0.680764072151898,
            ]),
            timing: Timing::default(),
            policy: InterpolationPolicy::default(),
            iterations: IterationRamp::default(),
            resolution: Resolution {
                width: 1920,
                height: 1080,
            },
            workers: 2,
            retries: 0,
            naming: FrameNaming::default(),
            renderer: RendererConfig::default(),
            encoder: EncodeConfig::default(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl ZoomConfig {
    pub fn load(path: &Path) -> ZoomResult<Self> {
        let f = std::fs::File::open(path)
            .with_context(|| format!("open config '{}'", path.display()))?;
        serde_json::from_reader(std::io::BufReader::new(f))
            .map_err(|e| ZoomError::config(format!("parse '{}': {e}", path.display())))
    }

    pub fn to_json_pretty(&self) -> ZoomResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ZoomError::config(e.to_string()))
    }

    pub fn frame_count(&self) -> u64 {
        self.timing.frame_count()
    }

    /// Every parameter check that must pass before anything is dispatched.
    pub fn validate(&self) -> ZoomResult<()> {
        if self.timing.fps == 0 {
            return Err(ZoomError::invalid("fps must be > 0"));
        }
        if !(self.timing.duration_secs.is_finite() && self.timing.duration_secs > 0.0) {
            return Err(ZoomError::invalid("duration_secs must be a positive number"));
        }
        if self.workers == 0 {
            return Err(ZoomError::invalid("workers must be >= 1"));
        }
        if self.renderer.program.as_os_str().is_empty() {
            return Err(ZoomError::invalid("renderer program must be set"));
        }
        if self.renderer.timeout_secs == Some(0) {
            return Err(ZoomError::invalid("renderer timeout must be > 0 when set"));
        }
        self.resolution.validate()?;
        self.encoder.validate()?;
        // Building the path and budget runs the viewport, frame-count and policy checks.
        let frames = self.frame_count();
        self.viewport_path()?;
        self.budget()?;
        self.naming.validate(frames)
    }

    pub fn viewport_path(&self) -> ZoomResult<ViewportPath> {
        ViewportPath::new(self.start, self.target, self.frame_count(), self.policy)
    }

    pub fn budget(&self) -> ZoomResult<IterationBudget> {
        let frames = self.frame_count();
        match self.iterations.end {
            Some(end) => IterationBudget::new(self.iterations.start, end, frames),
            None => IterationBudget::constant(self.iterations.start, frames),
        }
    }

    /// The full, ordered frame plan for this configuration.
    pub fn plan(&self) -> ZoomResult<FramePlan> {
        self.validate()?;
        let path = self.viewport_path()?;
        let budget = self.budget()?;
        FramePlan::build(&path, budget.iter(), self.resolution, &self.naming)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config/config.rs"]
mod tests;
