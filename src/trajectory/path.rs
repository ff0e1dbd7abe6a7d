use crate::foundation::core::Viewport;
use crate::foundation::error::{ZoomError, ZoomResult};
use crate::trajectory::policy::{InterpolationPolicy, Pacing};

/// Pure, deterministic mapping from frame index to viewport.
///
/// Every frame is computed in closed form from `(start, target, frames, pacing)`, so
/// re-creating the path with identical inputs reproduces the same viewports bit for bit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportPath {
    start: Viewport,
    target: Viewport,
    frames: u64,
    pacing: Pacing,
}

impl ViewportPath {
    pub fn new(
        start: Viewport,
        target: Viewport,
        frames: u64,
        policy: InterpolationPolicy,
    ) -> ZoomResult<Self> {
        start.validate()?;
        target.validate()?;
        if !start.contains(&target) {
            return Err(ZoomError::invalid(
                "target viewport must lie inside the start viewport",
            ));
        }
        let pacing = policy.resolve(&start, &target, frames)?;
        Ok(Self {
            start,
            target,
            frames,
            pacing,
        })
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// Viewport at frame `f`. Indices past the end clamp to the last frame.
    pub fn at(&self, f: u64) -> Viewport {
        let f = f.min(self.frames - 1);
        let t = self.pacing.progress(f, self.frames);
        let s = self.start.bounds();
        let e = self.target.bounds();
        // `s * (1 - t) + e * t` lands exactly on `s` at t == 0 and on `e` at t == 1.
        Viewport::from_bounds(std::array::from_fn(|i| s[i] * (1.0 - t) + e[i] * t))
    }

    /// Lazily walk the path once from frame 0.
    pub fn iter(&self) -> ViewportIter {
        ViewportIter {
            path: *self,
            next: 0,
        }
    }
}

impl IntoIterator for &ViewportPath {
    type Item = Viewport;
    type IntoIter = ViewportIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Single forward pass over a [`ViewportPath`].
#[derive(Clone, Debug)]
pub struct ViewportIter {
    path: ViewportPath,
    next: u64,
}

impl Iterator for ViewportIter {
    type Item = Viewport;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.path.frames {
            return None;
        }
        let v = self.path.at(self.next);
        self.next += 1;
        Some(v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.path.frames.saturating_sub(self.next) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for ViewportIter {}

#[cfg(test)]
#[path = "../../tests/unit/trajectory/path.rs"]
mod tests;
