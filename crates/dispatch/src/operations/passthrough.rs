use meshbridge_geometry::GeometryError;
use meshbridge_mesh::MeshDescriptor;

use crate::{Construct, ConstructError, HostMesh, Operation, ParamReader, ParameterBag, ResultPayload};

pub const PASSTHROUGH_MESSAGE: &str = "This is a message from a pure Rust operation.";

pub const PASSTHROUGH_VERTICES: [f64; 12] = [
    0.0, 0.0, 0.0, //
    1.0, 0.0, 0.0, //
    0.5, 1.0, 0.0, //
    0.5, 0.5, 1.0, //
];

pub const PASSTHROUGH_FACES: [u32; 12] = [0, 1, 2, 3, 1, 2, 3, 0, 2, 0, 1, 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassthroughOutput {
    DisplayText,
    AddMesh,
}

/// Canned results that exercise the dispatch and encoding path without geometry.
#[derive(Debug)]
pub struct Passthrough {
    output: PassthroughOutput,
}

impl Construct for Passthrough {
    const NAME: &'static str = "test";

    fn construct(
        parameters: &ParameterBag,
        _mesh: Option<&HostMesh>,
    ) -> Result<Self, ConstructError> {
        let mut reader = ParamReader::new(parameters);
        let output = reader.choice(
            "output_option",
            &[
                ("DISPLAY_TEXT", PassthroughOutput::DisplayText),
                ("ADD_MESH", PassthroughOutput::AddMesh),
            ],
            PassthroughOutput::DisplayText,
        )?;
        reader.finish()?;
        Ok(Self { output })
    }
}

impl Operation for Passthrough {
    fn execute(self: Box<Self>) -> Result<ResultPayload, GeometryError> {
        Ok(match self.output {
            PassthroughOutput::DisplayText => ResultPayload::message(PASSTHROUGH_MESSAGE),
            PassthroughOutput::AddMesh => ResultPayload::add_mesh(MeshDescriptor::new(
                PASSTHROUGH_VERTICES.to_vec(),
                PASSTHROUGH_FACES.to_vec(),
            )),
        })
    }
}
