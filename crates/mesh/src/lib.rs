mod codec;
mod descriptor;
mod error;
mod geometry;
mod surface_mesh;

pub use codec::*;
pub use descriptor::*;
pub use error::*;
pub use geometry::*;
pub use surface_mesh::*;
