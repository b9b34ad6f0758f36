//! Conversion between the host's flat arrays and [`SurfaceMesh`].
//!
//! Decoding is a straight walk over the arrays. Encoding is the delicate part: once
//! an operation has removed vertices, the handles of the survivors are no longer
//! contiguous, so faces have to be written through a [`VertexReindexing`] that maps
//! each surviving handle onto its position in the vertex array.

use std::collections::HashMap;

use crate::{MeshDescriptor, MeshError, Result, SurfaceMesh, Vector3, VertexId};

/// Dense output positions for the live vertices of one mesh revision.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexReindexing {
    indices: HashMap<VertexId, u32>,
    revision: u64,
}

impl VertexReindexing {
    pub fn get(&self, v: VertexId) -> Option<u32> {
        self.indices.get(&v).copied()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// The mesh revision this reindexing was built from.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// True when every vertex keeps the index it had when the mesh was decoded.
    pub fn is_identity(&self) -> bool {
        self.indices.iter().all(|(v, &i)| v.idx() == i as usize)
    }
}

/// Builds a [`SurfaceMesh`] from flat arrays.
///
/// Vertex `i` of the descriptor becomes the `i`-th vertex added to the mesh, so on a
/// freshly decoded mesh handles and input positions coincide.
pub fn decode(desc: &MeshDescriptor) -> Result<SurfaceMesh> {
    // Validate everything up front so a bad request never yields a half built mesh.
    desc.validate()?;

    let mut mesh = SurfaceMesh::with_capacity(desc.vertex_count(), desc.face_count());
    let handles = desc
        .vertices
        .chunks_exact(3)
        .map(|p| mesh.add_vertex(Vector3::new(p[0], p[1], p[2])))
        .collect::<Result<Vec<VertexId>>>()?;
    for f in desc.faces.chunks_exact(3) {
        mesh.add_face(
            handles[f[0] as usize],
            handles[f[1] as usize],
            handles[f[2] as usize],
        )?;
    }
    Ok(mesh)
}

/// Flattens the live vertex positions in iteration order.
pub fn encode_vertices(mesh: &SurfaceMesh) -> Vec<f64> {
    let mut out = Vec::with_capacity(mesh.number_of_vertices() * 3);
    for v in mesh.vertices() {
        let p = mesh.point(v);
        out.extend_from_slice(&[p.x, p.y, p.z]);
    }
    out
}

/// Assigns `0..n` to the live vertices in the same order [`encode_vertices`] emits
/// them.
///
/// Must be called again after any change to the vertex set; [`encode_faces`] refuses
/// a reindexing built from an older revision.
pub fn build_reindexing(mesh: &SurfaceMesh) -> VertexReindexing {
    // Positions are below the number of issued handles, which all fit in u32.
    VertexReindexing {
        indices: mesh
            .vertices()
            .enumerate()
            .map(|(i, v)| (v, i as u32))
            .collect(),
        revision: mesh.revision(),
    }
}

/// Flattens the live faces in iteration order, writing each corner's dense index.
pub fn encode_faces(mesh: &SurfaceMesh, reindexing: &VertexReindexing) -> Result<Vec<u32>> {
    if reindexing.revision != mesh.revision() {
        return Err(MeshError::StaleReindexing {
            built: reindexing.revision,
            current: mesh.revision(),
        });
    }
    let mut out = Vec::with_capacity(mesh.number_of_faces() * 3);
    for f in mesh.faces() {
        for v in mesh.face_vertices(f) {
            out.push(reindexing.get(v).ok_or(MeshError::DeadVertex(v))?);
        }
    }
    Ok(out)
}

/// Encodes vertices and faces from a single snapshot of `mesh`.
pub fn encode(mesh: &SurfaceMesh) -> Result<MeshDescriptor> {
    let reindexing = build_reindexing(mesh);
    Ok(MeshDescriptor {
        vertices: encode_vertices(mesh),
        faces: encode_faces(mesh, &reindexing)?,
    })
}
