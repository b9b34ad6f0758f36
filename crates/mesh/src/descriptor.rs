use serde::{Deserialize, Serialize};

use crate::{MeshError, Result};

/// A mesh as the host sees it: two flat arrays.
///
/// `vertices` holds x,y,z for each vertex back to back and `faces` holds the three
/// vertex indices of each triangle back to back. Index `i` in `faces` refers to the
/// vertex whose coordinates start at `vertices[3 * i]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshDescriptor {
    pub vertices: Vec<f64>,
    pub faces: Vec<u32>,
}

impl MeshDescriptor {
    pub fn new(vertices: Vec<f64>, faces: Vec<u32>) -> Self {
        Self { vertices, faces }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn face_count(&self) -> usize {
        self.faces.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.faces.is_empty()
    }

    /// Checks the array shapes and that every face index names an existing vertex.
    pub fn validate(&self) -> Result<()> {
        if self.vertices.len() % 3 != 0 {
            return Err(MeshError::VertexArrayLength(self.vertices.len()));
        }
        if self.faces.len() % 3 != 0 {
            return Err(MeshError::FaceArrayLength(self.faces.len()));
        }
        let vertex_count = self.vertex_count();
        for (face, triple) in self.faces.chunks_exact(3).enumerate() {
            if let Some(&index) = triple.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(MeshError::IndexOutOfRange {
                    face,
                    index: i64::from(index),
                    vertex_count,
                });
            }
        }
        Ok(())
    }
}
