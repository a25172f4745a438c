//! Action dispatch and the damage pipeline.

pub mod actions;
pub mod damage;
pub mod momentum;
pub mod resolver;
pub mod technical;
