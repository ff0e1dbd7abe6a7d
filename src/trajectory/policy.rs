use crate::foundation::core::Viewport;
use crate::foundation::error::{ZoomError, ZoomResult};

/// How the viewport travels from the start window to the target window.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InterpolationPolicy {
    /// Constant per-frame delta on every bound.
    Linear,
    /// Per-frame delta decays by a fixed `ratio` in `(0, 1)`.
    Exponential { ratio: f64 },
    /// Like [`InterpolationPolicy::Exponential`], with the ratio derived from the absolute
    /// size of the target window.
    Geometric,
    /// Like [`InterpolationPolicy::Geometric`], with the ratio derived from the target size
    /// relative to the start window.
    RelativeGeometric,
}

impl Default for InterpolationPolicy {
    fn default() -> Self {
        Self::Exponential { ratio: 0.9 }
    }
}

/// A policy with every data-dependent parameter resolved.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Pacing {
    Linear,
    Decay { ratio: f64 },
}

impl InterpolationPolicy {
    /// Resolve the policy against concrete endpoints and frame count.
    ///
    /// The geometric ratio is `min(target_w, target_h) ^ (1 / frames)`: the per-frame shrink
    /// that takes a unit-sized domain down to the target window size in exactly `frames`
    /// steps. The relative variant divides each target extent by the start extent first.
    pub fn resolve(self, start: &Viewport, target: &Viewport, frames: u64) -> ZoomResult<Pacing> {
        if frames < 2 {
            return Err(ZoomError::invalid(format!(
                "frame count must be >= 2 (got {frames})"
            )));
        }
        match self {
            Self::Linear => Ok(Pacing::Linear),
            Self::Exponential { ratio } => {
                check_ratio(ratio)?;
                Ok(Pacing::Decay { ratio })
            }
            Self::Geometric => {
                let shrink = target.width().min(target.height());
                derived_decay("geometric", shrink, frames)
            }
            Self::RelativeGeometric => {
                let shrink = (target.width() / start.width()).min(target.height() / start.height());
                derived_decay("relative geometric", shrink, frames)
            }
        }
    }
}

fn derived_decay(name: &str, shrink: f64, frames: u64) -> ZoomResult<Pacing> {
    let ratio = shrink.powf(1.0 / frames as f64);
    check_ratio(ratio).map_err(|_| {
        ZoomError::invalid(format!(
            "{name} policy needs a target window smaller than its reference size \
             (derived ratio {ratio})"
        ))
    })?;
    Ok(Pacing::Decay { ratio })
}

fn check_ratio(ratio: f64) -> ZoomResult<()> {
    if !(ratio > 0.0 && ratio < 1.0) {
        return Err(ZoomError::invalid(format!(
            "decay ratio must be in (0, 1) (got {ratio})"
        )));
    }
    Ok(())
}

impl Pacing {
    /// Fraction of the start→target distance covered at frame `f` of `frames`.
    ///
    /// `progress(0) == 0` exactly; `progress(frames - 1) == 1` up to rounding.
    pub fn progress(self, f: u64, frames: u64) -> f64 {
        let last = frames.saturating_sub(1).max(1);
        match self {
            Self::Linear => f as f64 / last as f64,
            Self::Decay { ratio } => {
                // Closed form of `bound(f+1) = bound(f) + norm * r^f`
                // with `norm = (target - start) * (1 - r) / (1 - r^(frames-1))`.
                let denom = 1.0 - ratio.powf(last as f64);
                (1.0 - ratio.powf(f as f64)) / denom
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/trajectory/policy.rs"]
mod tests;
