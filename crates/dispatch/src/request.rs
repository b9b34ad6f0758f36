use meshbridge_mesh::{MeshDescriptor, MeshError};
use serde::{Deserialize, Serialize};

use crate::{ParamValue, ParameterBag};

/// Mesh arrays exactly as the host sent them.
///
/// Face indices are kept wide so that a negative or oversized index reaches mesh
/// validation instead of failing while the request is parsed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostMesh {
    pub vertices: Vec<f64>,
    pub faces: Vec<i64>,
}

impl HostMesh {
    /// Narrows the face indices to `u32`.
    ///
    /// Only the index width is checked here; shapes and ranges are left to
    /// [`MeshDescriptor::validate`].
    pub fn to_descriptor(&self) -> Result<MeshDescriptor, MeshError> {
        let vertex_count = self.vertices.len() / 3;
        let faces = self
            .faces
            .iter()
            .enumerate()
            .map(|(i, &index)| {
                u32::try_from(index).map_err(|_| MeshError::IndexOutOfRange {
                    face: i / 3,
                    index,
                    vertex_count,
                })
            })
            .collect::<Result<Vec<u32>, _>>()?;
        Ok(MeshDescriptor::new(self.vertices.clone(), faces))
    }
}

impl From<MeshDescriptor> for HostMesh {
    fn from(mesh: MeshDescriptor) -> Self {
        Self {
            vertices: mesh.vertices,
            faces: mesh.faces.into_iter().map(i64::from).collect(),
        }
    }
}

/// One call from the host: an operation name, its parameters and possibly a mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawRequest", into = "RawRequest")]
pub struct Request {
    pub operation: String,
    pub parameters: ParameterBag,
    pub mesh: Option<HostMesh>,
}

// Wire form: `vertices` and `faces` sit next to the operation name and are optional.
#[derive(Serialize, Deserialize)]
struct RawRequest {
    operation: String,
    #[serde(default)]
    parameters: ParameterBag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vertices: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    faces: Option<Vec<i64>>,
}

impl From<RawRequest> for Request {
    fn from(raw: RawRequest) -> Self {
        let mesh = match (raw.vertices, raw.faces) {
            (None, None) => None,
            (vertices, faces) => Some(HostMesh {
                vertices: vertices.unwrap_or_default(),
                faces: faces.unwrap_or_default(),
            }),
        };
        Request {
            operation: raw.operation,
            parameters: raw.parameters,
            mesh,
        }
    }
}

impl From<Request> for RawRequest {
    fn from(request: Request) -> Self {
        let (vertices, faces) = match request.mesh {
            Some(mesh) => (Some(mesh.vertices), Some(mesh.faces)),
            None => (None, None),
        };
        RawRequest {
            operation: request.operation,
            parameters: request.parameters,
            vertices,
            faces,
        }
    }
}

impl Request {
    pub fn new<S: Into<String>>(operation: S) -> Self {
        Self {
            operation: operation.into(),
            parameters: ParameterBag::new(),
            mesh: None,
        }
    }

    pub fn with_parameter<K: Into<String>, V: Into<ParamValue>>(mut self, key: K, value: V) -> Self {
        self.parameters.insert(key, value);
        self
    }

    pub fn with_mesh<M: Into<HostMesh>>(mut self, mesh: M) -> Self {
        self.mesh = Some(mesh.into());
        self
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_without_mesh() {
        let request =
            Request::from_json(r#"{"operation": "test", "parameters": {"output_option": "ADD_MESH"}}"#)
                .unwrap();
        assert_eq!(
            request,
            Request::new("test").with_parameter("output_option", "ADD_MESH")
        );
    }

    #[test]
    fn parse_with_mesh() {
        let request = Request::from_json(
            r#"{"operation": "area_computation", "vertices": [0, 0, 0, 1, 0, 0, 0, 1, 0], "faces": [0, 1, 2]}"#,
        )
        .unwrap();
        let mesh = request.mesh.unwrap().to_descriptor().unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.faces, vec![0, 1, 2]);
        assert!(request.parameters.is_empty());
    }

    #[test]
    fn wide_indices_parse_and_fail_narrowing() {
        let request =
            Request::from_json(r#"{"operation": "x", "vertices": [0, 0, 0], "faces": [0, 0, -1]}"#)
                .unwrap();
        let mesh = request.mesh.unwrap();
        assert_eq!(mesh.faces, vec![0, 0, -1]);
        assert_eq!(
            mesh.to_descriptor(),
            Err(MeshError::IndexOutOfRange {
                face: 0,
                index: -1,
                vertex_count: 1,
            })
        );

        let too_wide = HostMesh {
            vertices: vec![0.0; 9],
            faces: vec![0, 1, 2, 0, 1, 1 << 32],
        };
        assert_eq!(
            too_wide.to_descriptor(),
            Err(MeshError::IndexOutOfRange {
                face: 1,
                index: 1 << 32,
                vertex_count: 3,
            })
        );
    }

    #[test]
    fn json_round_trip() {
        let request = Request::new("simplification")
            .with_parameter("decimation_factor", 0.5)
            .with_mesh(MeshDescriptor::new(vec![0.0; 9], vec![0, 1, 2]));
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(Request::from_json(&json).unwrap(), request);
    }
}
