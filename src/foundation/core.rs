use crate::foundation::error::{ZoomError, ZoomResult};

/// Absolute 0-based frame index in the zoom timeline.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct FrameIndex(pub u64);

impl std::fmt::Display for FrameIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Closed real interval `[min, max]` on one axis of the parameter plane.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Interval {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl Interval {
    /// Create a validated interval with finite bounds and `min < max`.
    pub fn new(min: f64, max: f64) -> ZoomResult<Self> {
        let out = Self { min, max };
        out.validate()?;
        Ok(out)
    }

    pub fn validate(self) -> ZoomResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(ZoomError::invalid("interval bounds must be finite"));
        }
        if self.min >= self.max {
            return Err(ZoomError::invalid(format!(
                "interval min must be < max (got [{}, {}])",
                self.min, self.max
            )));
        }
        Ok(())
    }

    pub fn width(self) -> f64 {
        self.max - self.min
    }

    pub fn center(self) -> f64 {
        0.5 * (self.min + self.max)
    }

    /// Return `true` when `other` lies inside `self` (bounds may touch).
    pub fn contains(self, other: Interval) -> bool {
        self.min <= other.min && other.max <= self.max
    }
}

/// Rectangular region of the parameter plane: an x-interval and a y-interval.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    pub x: Interval,
    pub y: Interval,
}

impl Viewport {
    /// Create a validated viewport from raw bounds.
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> ZoomResult<Self> {
        Ok(Self {
            x: Interval::new(x_min, x_max)?,
            y: Interval::new(y_min, y_max)?,
        })
    }

    /// Viewport centered on `(cx, cy)` extending `half_w`/`half_h` on each side.
    pub fn centered(cx: f64, cy: f64, half_w: f64, half_h: f64) -> ZoomResult<Self> {
        if !(half_w > 0.0) || !(half_h > 0.0) {
            return Err(ZoomError::invalid("viewport half extents must be > 0"));
        }
        Self::new(cx - half_w, cx + half_w, cy - half_h, cy + half_h)
    }

    pub fn validate(&self) -> ZoomResult<()> {
        self.x.validate()?;
        self.y.validate()
    }

    pub fn width(&self) -> f64 {
        self.x.width()
    }

    pub fn height(&self) -> f64 {
        self.y.width()
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x.center(), self.y.center())
    }

    pub fn contains(&self, other: &Viewport) -> bool {
        self.x.contains(other.x) && self.y.contains(other.y)
    }

    /// Bounds in renderer argument order: `x_min, x_max, y_min, y_max`.
    pub fn bounds(&self) -> [f64; 4] {
        [self.x.min, self.x.max, self.y.min, self.y.max]
    }

    pub(crate) fn from_bounds(b: [f64; 4]) -> Self {
        Self {
            x: Interval {
                min: b[0],
                max: b[1],
            },
            y: Interval {
                min: b[2],
                max: b[3],
            },
        }
    }
}

/// Output image dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> ZoomResult<Self> {
        let out = Self { width, height };
        out.validate()?;
        Ok(out)
    }

    pub fn validate(self) -> ZoomResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ZoomError::invalid("resolution width/height must be non-zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
