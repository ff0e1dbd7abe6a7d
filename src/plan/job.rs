use std::path::PathBuf;

use crate::foundation::core::{FrameIndex, Resolution, Viewport};
use crate::foundation::error::{ZoomError, ZoomResult};

/// One fully-specified unit of rendering work for a single output frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FrameJob {
    pub index: FrameIndex,
    pub viewport: Viewport,
    pub resolution: Resolution,
    pub iterations: u32,
    pub output: PathBuf,
}

/// Output layout for frame images: `<dir>/<prefix>_<zero-padded index>.<extension>`.
///
/// The fixed-width index makes lexicographic order equal frame order, which both the
/// encoder glob and the resume check depend on.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FrameNaming {
    pub dir: PathBuf,
    pub prefix: String,
    pub extension: String,
    pub pad_width: usize,
}

impl Default for FrameNaming {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("snaps"),
            prefix: "fractal".to_string(),
            extension: "png".to_string(),
            pad_width: 4,
        }
    }
}

impl FrameNaming {
    pub fn validate(&self, frames: u64) -> ZoomResult<()> {
        if self.prefix.is_empty() || self.prefix.contains(['/', '\\', '*']) {
            return Err(ZoomError::invalid(format!(
                "frame prefix must be a non-empty plain file name (got {:?})",
                self.prefix
            )));
        }
        if self.extension.is_empty() || self.extension.contains(['.', '/', '\\', '*']) {
            return Err(ZoomError::invalid(format!(
                "frame extension must be non-empty without dots (got {:?})",
                self.extension
            )));
        }
        let needed = digits(frames.saturating_sub(1));
        if self.pad_width < needed {
            return Err(ZoomError::invalid(format!(
                "pad width {} is too narrow for {frames} frames (needs {needed})",
                self.pad_width
            )));
        }
        Ok(())
    }

    pub fn file_name(&self, index: FrameIndex) -> String {
        format!(
            "{}_{:0width$}.{}",
            self.prefix,
            index.0,
            self.extension,
            width = self.pad_width
        )
    }

    pub fn path_for(&self, index: FrameIndex) -> PathBuf {
        self.dir.join(self.file_name(index))
    }

    /// Glob selecting every frame of this layout, e.g. `snaps/fractal_*.png`.
    pub fn glob_pattern(&self) -> PathBuf {
        self.dir.join(format!("{}_*.{}", self.prefix, self.extension))
    }
}

fn digits(mut n: u64) -> usize {
    let mut d = 1;
    while n >= 10 {
        n /= 10;
        d += 1;
    }
    d
}

#[cfg(test)]
#[path = "../../tests/unit/plan/job.rs"]
mod tests;
