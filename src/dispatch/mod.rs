//! Bounded-parallel, resumable execution of frame jobs.

pub mod cancel;
pub mod dispatcher;
pub mod progress;
pub mod result;
