use std::fmt;

use meshbridge_geometry::GeometryError;
use meshbridge_mesh::{decode, MeshError, SurfaceMesh};
use thiserror::Error;

use crate::{HostMesh, ParamError, ParameterBag, ResultPayload};

/// Why an operation could not be built from a request.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConstructError {
    #[error(transparent)]
    Parameters(#[from] ParamError),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error("operation needs a mesh but the request carries none")]
    MissingMesh,
}

/// A fully validated, ready to run operation.
///
/// `execute` consumes the operation, so each one runs at most once.
pub trait Operation: fmt::Debug {
    fn execute(self: Box<Self>) -> Result<ResultPayload, GeometryError>;
}

/// An operation that can be registered by type.
pub trait Construct: Operation + Sized + 'static {
    /// Name the host requests the operation by.
    const NAME: &'static str;

    fn construct(
        parameters: &ParameterBag,
        mesh: Option<&HostMesh>,
    ) -> Result<Self, ConstructError>;
}

/// Decodes the request mesh, which must be present.
pub fn require_mesh(mesh: Option<&HostMesh>) -> Result<SurfaceMesh, ConstructError> {
    let desc = mesh.ok_or(ConstructError::MissingMesh)?.to_descriptor()?;
    Ok(decode(&desc)?)
}
