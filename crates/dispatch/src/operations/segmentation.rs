use log::{debug, info};
use meshbridge_geometry::{
    remove_degenerate_faces, sdf_values, segmentation_from_sdf_values, GeometryError, SdfParams,
    Segmentation, MAX_CLUSTERS,
};
use meshbridge_mesh::{encode, SurfaceMesh};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{require_mesh, Construct, ConstructError, HostMesh, Operation, ParamReader, ParameterBag, ResultPayload};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegmentationOutput {
    DisplayText,
    SegmentsColor,
}

/// SDF based segmentation.
///
/// Degenerate faces are dropped before the SDF is computed. When that changes the
/// face count, a colored result also carries the cleaned mesh so the host can
/// rebuild its object before applying per-face colors.
#[derive(Debug)]
pub struct SurfaceSegmentation {
    mesh: SurfaceMesh,
    input_faces: usize,
    clusters: usize,
    smoothness: f64,
    output: SegmentationOutput,
}

impl Construct for SurfaceSegmentation {
    const NAME: &'static str = "segmentation";

    fn construct(
        parameters: &ParameterBag,
        mesh: Option<&HostMesh>,
    ) -> Result<Self, ConstructError> {
        let mut reader = ParamReader::new(parameters);
        let clusters = reader.integer_in("clusters", 1, MAX_CLUSTERS)?;
        let smoothness = reader.non_negative_float("smoothness")?;
        let output = reader.choice(
            "output_option",
            &[
                ("DISPLAY_TEXT", SegmentationOutput::DisplayText),
                ("SEGMENTS_COLOR", SegmentationOutput::SegmentsColor),
            ],
            SegmentationOutput::DisplayText,
        )?;
        reader.finish()?;

        let mesh = require_mesh(mesh)?;
        debug!("segmentation input: {} faces", mesh.number_of_faces());
        Ok(Self {
            input_faces: mesh.number_of_faces(),
            mesh,
            clusters,
            smoothness,
            output,
        })
    }
}

impl Operation for SurfaceSegmentation {
    fn execute(self: Box<Self>) -> Result<ResultPayload, GeometryError> {
        let Self {
            mut mesh,
            input_faces,
            clusters,
            smoothness,
            output,
        } = *self;
        remove_degenerate_faces(&mut mesh)?;
        let sdf = sdf_values(&mesh, &SdfParams::default())?;
        let segmentation = segmentation_from_sdf_values(&mesh, &sdf, clusters, smoothness)?;
        info!("segmentation: {} segments", segmentation.number_of_segments);

        match output {
            SegmentationOutput::DisplayText => Ok(ResultPayload::message(format!(
                "Parameters used:\n\
                 - number of clusters: {}\n\
                 - smoothness: {}\n\n\
                 Number of segments obtained: {}.",
                clusters, smoothness, segmentation.number_of_segments
            ))),
            SegmentationOutput::SegmentsColor => {
                let colors = face_colors(&mesh, &segmentation, &mut StdRng::from_entropy());
                let payload = if mesh.number_of_faces() != input_faces {
                    debug!(
                        "face count changed from {} to {}, replacing mesh",
                        input_faces,
                        mesh.number_of_faces()
                    );
                    ResultPayload::replace_mesh(encode(&mesh)?)
                } else {
                    ResultPayload::default()
                };
                Ok(payload.with_face_coloration(colors))
            }
        }
    }
}

/// One random opaque color per segment, spread over the faces as flat RGBA.
fn face_colors<R: Rng>(mesh: &SurfaceMesh, segmentation: &Segmentation, rng: &mut R) -> Vec<f32> {
    let palette: Vec<[f32; 3]> = (0..segmentation.number_of_segments)
        .map(|_| [rng.gen(), rng.gen(), rng.gen()])
        .collect();
    let mut colors = Vec::with_capacity(mesh.number_of_faces() * 4);
    for f in mesh.faces() {
        let [r, g, b] = palette[segmentation.segment_ids[f]];
        colors.extend_from_slice(&[r, g, b, 1.0]);
    }
    colors
}
