//! The operations shipped in the standard registry.

mod area;
mod passthrough;
mod segmentation;
mod simplification;

pub use area::*;
pub use passthrough::*;
pub use segmentation::*;
pub use simplification::*;
