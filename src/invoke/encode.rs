use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use crate::foundation::error::{ZoomError, ZoomResult};

/// Codec/quality settings for the final video. Plain values, fixed for a run.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    /// Encoder binary; looked up on `PATH` when not a path.
    pub program: PathBuf,
    pub out_path: PathBuf,
    pub codec: String,
    pub crf: u8,
    pub pix_fmt: String,
    /// Optional `-tune` hint; empty disables it.
    pub tune: String,
    pub overwrite: bool,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            out_path: PathBuf::from("out.mp4"),
            codec: "libx264".to_string(),
            crf: 15,
            pix_fmt: "yuv444p".to_string(),
            tune: "stillimage".to_string(),
            overwrite: true,
        }
    }
}

impl EncodeConfig {
    pub fn validate(&self) -> ZoomResult<()> {
        if self.codec.is_empty() {
            return Err(ZoomError::invalid("encode codec must be non-empty"));
        }
        if self.pix_fmt.is_empty() {
            return Err(ZoomError::invalid("encode pix_fmt must be non-empty"));
        }
        if self.crf > 63 {
            return Err(ZoomError::invalid(format!(
                "encode crf must be <= 63 (got {})",
                self.crf
            )));
        }
        if self.out_path.as_os_str().is_empty() {
            return Err(ZoomError::invalid("encode output path must be non-empty"));
        }
        Ok(())
    }

    pub fn with_out_path(mut self, out_path: impl Into<PathBuf>) -> Self {
        self.out_path = out_path.into();
        self
    }
}

/// One encoder invocation: which frames, at what rate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodeRequest {
    pub fps: u32,
    /// Glob matching the frame images; lexicographic order is frame order.
    pub frames_glob: PathBuf,
}

/// Capability that assembles rendered frames into a video. Invoked once per run.
pub trait VideoEncoder: Send + Sync {
    fn encode(&self, req: &EncodeRequest) -> ZoomResult<()>;
}

pub fn is_program_on_path(program: &Path) -> bool {
    Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn ensure_parent_dir(path: &Path) -> ZoomResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Encodes frames by running the system `ffmpeg` binary with a glob input.
#[derive(Clone, Debug)]
pub struct FfmpegEncoder {
    cfg: EncodeConfig,
}

impl FfmpegEncoder {
    pub fn new(cfg: EncodeConfig) -> ZoomResult<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &EncodeConfig {
        &self.cfg
    }

    /// Full argument list (excluding the program) for `req`.
    pub fn build_args(&self, req: &EncodeRequest) -> Vec<String> {
        let cfg = &self.cfg;
        let mut args: Vec<String> = vec![
            if cfg.overwrite { "-y" } else { "-n" }.to_string(),
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-framerate".to_string(),
            req.fps.to_string(),
            "-pattern_type".to_string(),
            "glob".to_string(),
            "-i".to_string(),
            req.frames_glob.to_string_lossy().to_string(),
            "-c:v".to_string(),
            cfg.codec.clone(),
            "-crf".to_string(),
            cfg.crf.to_string(),
        ];
        if !cfg.tune.is_empty() {
            args.push("-tune".to_string());
            args.push(cfg.tune.clone());
        }
        args.push("-pix_fmt".to_string());
        args.push(cfg.pix_fmt.clone());
        args.push(cfg.out_path.to_string_lossy().to_string());
        args
    }
}

impl VideoEncoder for FfmpegEncoder {
    #[tracing::instrument(skip(self), fields(out = %self.cfg.out_path.display()))]
    fn encode(&self, req: &EncodeRequest) -> ZoomResult<()> {
        if req.fps == 0 {
            return Err(ZoomError::invalid("encode fps must be non-zero"));
        }
        ensure_parent_dir(&self.cfg.out_path)?;

        if !self.cfg.overwrite && self.cfg.out_path.exists() {
            return Err(ZoomError::encode(format!(
                "output file '{}' already exists",
                self.cfg.out_path.display()
            )));
        }

        if !is_program_on_path(&self.cfg.program) {
            return Err(ZoomError::encode(format!(
                "'{}' is required for video encoding, but was not found",
                self.cfg.program.display()
            )));
        }

        let output = Command::new(&self.cfg.program)
            .args(self.build_args(req))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                ZoomError::encode(format!(
                    "failed to run '{}': {e}",
                    self.cfg.program.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ZoomError::encode(format!(
                "encoder exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        tracing::info!("video written");
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/invoke/encode.rs"]
mod tests;
