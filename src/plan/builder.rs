use crate::foundation::core::{FrameIndex, Resolution, Viewport};
use crate::foundation::error::{ZoomError, ZoomResult};
use crate::plan::job::{FrameJob, FrameNaming};

/// Ordered, immutable list of frame jobs covering indices `0..N` with no gaps.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct FramePlan {
    jobs: Vec<FrameJob>,
}

impl FramePlan {
    /// Compose per-frame viewports and iteration budgets into frame jobs.
    ///
    /// Both sequences must yield the same number of items (at least 2). No I/O happens
    /// here; output paths are only computed.
    pub fn build<V, B>(
        viewports: V,
        budgets: B,
        resolution: Resolution,
        naming: &FrameNaming,
    ) -> ZoomResult<Self>
    where
        V: IntoIterator<Item = Viewport>,
        B: IntoIterator<Item = u32>,
    {
        resolution.validate()?;

        let mut viewports = viewports.into_iter();
        let mut budgets = budgets.into_iter();
        let mut jobs = Vec::with_capacity(viewports.size_hint().0);

        loop {
            let index = FrameIndex(jobs.len() as u64);
            match (viewports.next(), budgets.next()) {
                (Some(viewport), Some(iterations)) => {
                    if iterations == 0 {
                        return Err(ZoomError::invalid(format!(
                            "frame {index} has a zero iteration budget"
                        )));
                    }
                    jobs.push(FrameJob {
                        index,
                        viewport,
                        resolution,
                        iterations,
                        output: naming.path_for(index),
                    });
                }
                (None, None) => break,
                _ => {
                    return Err(ZoomError::invalid(
                        "viewport and iteration sequences differ in length",
                    ));
                }
            }
        }

        if jobs.len() < 2 {
            return Err(ZoomError::invalid(format!(
                "frame plan needs at least 2 frames (got {})",
                jobs.len()
            )));
        }
        naming.validate(jobs.len() as u64)?;

        Ok(Self { jobs })
    }

    pub fn jobs(&self) -> &[FrameJob] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FrameJob> {
        self.jobs.iter()
    }

    pub fn into_jobs(self) -> Vec<FrameJob> {
        self.jobs
    }
}

impl<'a> IntoIterator for &'a FramePlan {
    type Item = &'a FrameJob;
    type IntoIter = std::slice::Iter<'a, FrameJob>;

    fn into_iter(self) -> Self::IntoIter {
        self.jobs.iter()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/plan/builder.rs"]
mod tests;
