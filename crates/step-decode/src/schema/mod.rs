//! Ready-made decoders for common AP203/AP214 entities.
//!
//! Everything here is built from the public combinators in
//! [`crate::decode`]; nothing has access to internals.

pub mod geometry;
pub mod header;
pub mod topology;

pub use geometry::*;
pub use header::*;
pub use topology::*;
