use std::collections::BTreeMap;

use meshbridge_mesh::{FaceId, FaceProperty, SurfaceMesh, VertexId};

/// A face across one edge of another face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceNeighbor {
    pub face: FaceId,
    /// The shared edge, low handle first.
    pub edge: (VertexId, VertexId),
}

fn ordered(a: VertexId, b: VertexId) -> (VertexId, VertexId) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Maps every undirected edge to the live faces that contain it.
pub fn edge_faces(mesh: &SurfaceMesh) -> BTreeMap<(VertexId, VertexId), Vec<FaceId>> {
    let mut map: BTreeMap<_, Vec<FaceId>> = BTreeMap::new();
    for f in mesh.faces() {
        let [a, b, c] = mesh.face_vertices(f);
        for (u, v) in [(a, b), (b, c), (c, a)] {
            if u != v {
                map.entry(ordered(u, v)).or_default().push(f);
            }
        }
    }
    map
}

/// For every live face, the faces sharing an edge with it.
///
/// Non-manifold edges connect every pair of their faces.
pub fn face_neighbors(mesh: &SurfaceMesh) -> FaceProperty<Vec<FaceNeighbor>> {
    let mut neighbors = FaceProperty::new(mesh, Vec::new());
    for (edge, faces) in edge_faces(mesh) {
        for &f in &faces {
            for &g in &faces {
                if f != g {
                    neighbors[f].push(FaceNeighbor { face: g, edge });
                }
            }
        }
    }
    neighbors
}

/// A vertex is on the boundary when one of its edges borders a single face.
pub fn is_boundary_vertex(mesh: &SurfaceMesh, v: VertexId) -> bool {
    let around = mesh.faces_around_vertex(v);
    mesh.vertices_around_vertex(v).into_iter().any(|u| {
        around
            .iter()
            .filter(|&&f| mesh.face_vertices(f).contains(&u))
            .count()
            == 1
    })
}

#[cfg(test)]
mod tests {
    use meshbridge_mesh::{decode, MeshDescriptor};
    use meshbridge_test_data::CUBE;

    use super::*;

    #[test]
    fn closed_cube() {
        let desc = MeshDescriptor::new(CUBE.vertices.to_vec(), CUBE.faces.to_vec());
        let mesh = decode(&desc).unwrap();

        let edges = edge_faces(&mesh);
        assert_eq!(edges.len(), 18);
        assert!(edges.values().all(|faces| faces.len() == 2));

        let neighbors = face_neighbors(&mesh);
        for f in mesh.faces() {
            assert_eq!(neighbors[f].len(), 3);
        }
        assert!(mesh.vertices().all(|v| !is_boundary_vertex(&mesh, v)));
    }

    #[test]
    fn single_triangle_is_all_boundary() {
        let desc = MeshDescriptor::new(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            vec![0, 1, 2],
        );
        let mesh = decode(&desc).unwrap();
        assert!(mesh.vertices().all(|v| is_boundary_vertex(&mesh, v)));
        let f = mesh.faces().next().unwrap();
        assert!(face_neighbors(&mesh)[f].is_empty());
    }
}
