//! # Utilities Module
//!
//! Geometry, spatial lookup, and graph reachability helpers shared by the
//! map model and the generation drivers.

pub mod math;
pub mod spatial;
pub mod traversal;

pub use math::*;
pub use spatial::*;
pub use traversal::*;
