use std::{
    io::Read as _,
    path::PathBuf,
    process::{Command, Stdio},
    time::{Duration, Instant},
};

use crate::plan::job::FrameJob;

/// Why a single frame failed to render. Recorded per frame, never fatal to a batch.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderError {
    #[error("failed to spawn renderer '{program}': {message}")]
    Spawn { program: String, message: String },

    #[error("renderer exited with {}: {stderr}", exit_label(*code))]
    Exit { code: Option<i32>, stderr: String },

    #[error("renderer timed out after {limit_ms} ms")]
    Timeout { limit_ms: u64 },

    #[error("renderer reported success but '{path}' was not written")]
    MissingOutput { path: String },

    #[error("{message}")]
    Other { message: String },
}

fn exit_label(code: Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "no status (killed by signal)".to_string(),
    }
}

/// Capability that turns one [`FrameJob`] into an image file at `job.output`.
///
/// Implementations are shared across dispatcher workers and must be safe to call
/// concurrently for distinct jobs.
pub trait RenderInvoker: Send + Sync {
    fn render(&self, job: &FrameJob) -> Result<(), RenderError>;
}

impl<F> RenderInvoker for F
where
    F: Fn(&FrameJob) -> Result<(), RenderError> + Send + Sync,
{
    fn render(&self, job: &FrameJob) -> Result<(), RenderError> {
        self(job)
    }
}

/// Renders a frame by running an external renderer binary.
///
/// Invocation: `<program> [leading_args..] x_min x_max y_min y_max iterations width height output`.
#[derive(Clone, Debug)]
pub struct ProcessRenderer {
    program: PathBuf,
    leading_args: Vec<String>,
    timeout: Option<Duration>,
}

const POLL_INTERVAL: Duration = Duration::from_millis(20);

impl ProcessRenderer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            timeout: None,
        }
    }

    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.leading_args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Positional arguments for `job`, after any leading args.
    ///
    /// Floats use Rust's shortest round-trip formatting so deep-zoom bounds survive
    /// the trip through decimal text unchanged.
    pub fn job_args(job: &FrameJob) -> Vec<String> {
        let mut args: Vec<String> = job.viewport.bounds().iter().map(f64::to_string).collect();
        args.push(job.iterations.to_string());
        args.push(job.resolution.width.to_string());
        args.push(job.resolution.height.to_string());
        args.push(job.output.to_string_lossy().to_string());
        args
    }

    fn wait(
        &self,
        mut child: std::process::Child,
    ) -> Result<std::process::ExitStatus, RenderError> {
        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {}
                Err(e) => {
                    return Err(RenderError::Other {
                        message: format!("failed to poll renderer: {e}"),
                    });
                }
            }
            if let Some(limit) = self.timeout
                && started.elapsed() >= limit
            {
                let _ = child.kill();
                let _ = child.wait();
                return Err(RenderError::Timeout {
                    limit_ms: limit.as_millis() as u64,
                });
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

impl RenderInvoker for ProcessRenderer {
    fn render(&self, job: &FrameJob) -> Result<(), RenderError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .args(Self::job_args(job))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| RenderError::Spawn {
            program: self.program.display().to_string(),
            message: e.to_string(),
        })?;

        // Drain stderr on a side thread so a chatty renderer cannot block on a full pipe.
        let stderr_reader = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut buf = String::new();
                let _ = pipe.read_to_string(&mut buf);
                buf
            })
        });

        let status = self.wait(child);
        let stderr = stderr_reader
            .and_then(|h| h.join().ok())
            .unwrap_or_default();
        let status = status?;

        if !status.success() {
            return Err(RenderError::Exit {
                code: status.code(),
                stderr: stderr.trim().to_string(),
            });
        }
        if !job.output.is_file() {
            return Err(RenderError::MissingOutput {
                path: job.output.display().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/invoke/render.rs"]
mod tests;
