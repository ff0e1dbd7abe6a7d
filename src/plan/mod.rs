//! Frame job descriptors and the up-front frame plan.

pub mod builder;
pub mod job;
