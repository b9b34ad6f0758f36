use log::info;
use meshbridge_geometry::{surface_area, GeometryError};
use meshbridge_mesh::SurfaceMesh;

use crate::{require_mesh, Construct, ConstructError, HostMesh, Operation, ParamReader, ParameterBag, ResultPayload};

/// Reports the total surface area of the mesh.
#[derive(Debug)]
pub struct AreaComputation {
    mesh: SurfaceMesh,
}

impl Construct for AreaComputation {
    const NAME: &'static str = "area_computation";

    fn construct(
        parameters: &ParameterBag,
        mesh: Option<&HostMesh>,
    ) -> Result<Self, ConstructError> {
        ParamReader::new(parameters).finish()?;
        Ok(Self {
            mesh: require_mesh(mesh)?,
        })
    }
}

impl Operation for AreaComputation {
    fn execute(self: Box<Self>) -> Result<ResultPayload, GeometryError> {
        let area = surface_area(&self.mesh);
        info!(
            "area of {} faces: {}",
            self.mesh.number_of_faces(),
            area
        );
        Ok(ResultPayload::message(format!("Mesh area: {} m².", area)))
    }
}
