//! Frame-index → (viewport, iteration budget) mathematics.

pub mod budget;
pub mod path;
pub mod policy;
