//! Geometry processing on [`SurfaceMesh`](meshbridge_mesh::SurfaceMesh).
//!
//! These are the numerical building blocks the operations delegate to: surface
//! area, mesh cleanup, edge collapse simplification and shape diameter function
//! based segmentation.

mod area;
mod bvh;
mod cleanup;
mod error;
mod sdf;
mod segment;
mod simplify;
mod topology;

pub use area::*;
pub use bvh::*;
pub use cleanup::*;
pub use error::*;
pub use sdf::*;
pub use segment::*;
pub use simplify::*;
pub use topology::*;
