//! Boundaries to the external renderer and video encoder processes.

pub mod encode;
pub mod render;
