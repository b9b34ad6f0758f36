use log::info;
use meshbridge_geometry::{edge_collapse, EdgeCountRatio, GeometryError};
use meshbridge_mesh::{
    build_reindexing, encode_faces, encode_vertices, MeshDescriptor, SurfaceMesh,
};

use crate::{require_mesh, Construct, ConstructError, HostMesh, Operation, ParamReader, ParameterBag, ResultPayload};

/// Edge collapse down to a fraction of the original edge count.
///
/// Always answers with `replace_mesh`, even when nothing was collapsed.
#[derive(Debug)]
pub struct SurfaceSimplification {
    mesh: SurfaceMesh,
    ratio: EdgeCountRatio,
}

impl Construct for SurfaceSimplification {
    const NAME: &'static str = "simplification";

    fn construct(
        parameters: &ParameterBag,
        mesh: Option<&HostMesh>,
    ) -> Result<Self, ConstructError> {
        let mut reader = ParamReader::new(parameters);
        let ratio = EdgeCountRatio(reader.fraction("decimation_factor")?);
        reader.finish()?;
        Ok(Self {
            mesh: require_mesh(mesh)?,
            ratio,
        })
    }
}

impl Operation for SurfaceSimplification {
    fn execute(self: Box<Self>) -> Result<ResultPayload, GeometryError> {
        let Self { mut mesh, ratio } = *self;
        let stats = edge_collapse(&mut mesh, ratio)?;
        info!(
            "simplification: {} of {} edges removed",
            stats.edges_removed(),
            stats.initial_edges
        );

        // Collapses leave holes in the vertex handles; faces go out through a fresh
        // reindexing of the survivors.
        let reindexing = build_reindexing(&mesh);
        let faces = encode_faces(&mesh, &reindexing)?;
        Ok(ResultPayload::replace_mesh(MeshDescriptor::new(
            encode_vertices(&mesh),
            faces,
        )))
    }
}
