use meshbridge_mesh::{FaceId, MeshError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GeometryError>;

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("mesh has no faces")]
    NoFaces,

    #[error("invalid {name} = {value} ({reason})")]
    InvalidArgument {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("face property has {actual} entries but the mesh has room for {expected}")]
    PropertySize { expected: usize, actual: usize },

    #[error("face {0} has no area")]
    DegenerateFace(FaceId),

    #[error(transparent)]
    Mesh(#[from] MeshError),
}

impl GeometryError {
    pub fn invalid_argument<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        GeometryError::InvalidArgument {
            name,
            value: value.to_string(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = GeometryError::invalid_argument("ratio", 1.5, "must be in (0, 1]");
        assert_eq!(err.to_string(), "invalid ratio = 1.5 (must be in (0, 1])");
        assert_eq!(GeometryError::NoFaces.to_string(), "mesh has no faces");
    }
}
