use crate::foundation::error::{ZoomError, ZoomResult};

/// Per-frame iteration budget, scaled geometrically from `start` to `end`.
///
/// `iters(f) = round(start * factor^f)` with `factor = (end / start)^(1 / (frames - 1))`,
/// which tracks the geometric shrink of the viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IterationBudget {
    start: u32,
    end: u32,
    frames: u64,
    factor: f64,
}

impl IterationBudget {
    pub fn new(start: u32, end: u32, frames: u64) -> ZoomResult<Self> {
        if start == 0 || end == 0 {
            return Err(ZoomError::invalid("iteration budgets must be > 0"));
        }
        if frames < 2 {
            return Err(ZoomError::invalid(format!(
                "frame count must be >= 2 (got {frames})"
            )));
        }
        let factor = (f64::from(end) / f64::from(start)).powf(1.0 / (frames - 1) as f64);
        Ok(Self {
            start,
            end,
            frames,
            factor,
        })
    }

    /// Same budget for every frame.
    pub fn constant(iters: u32, frames: u64) -> ZoomResult<Self> {
        Self::new(iters, iters, frames)
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn at(&self, f: u64) -> u32 {
        if f == 0 || self.start == self.end {
            return self.start;
        }
        let f = f.min(self.frames - 1);
        let raw = (f64::from(self.start) * self.factor.powf(f as f64)).round();
        raw.clamp(1.0, f64::from(u32::MAX)) as u32
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = u32> + '_ {
        (0..self.frames as usize).map(move |f| self.at(f as u64))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/trajectory/budget.rs"]
mod tests;
