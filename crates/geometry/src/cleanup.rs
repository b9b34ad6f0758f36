use log::debug;
use meshbridge_mesh::SurfaceMesh;

use crate::Result;

/// Triangles with less area than this are treated as degenerate.
pub const DEGENERATE_AREA: f64 = 1e-12;

/// What [`remove_degenerate_faces`] took out of the mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cleanup {
    pub faces_removed: usize,
    pub vertices_removed: usize,
}

/// Removes faces with a repeated corner or (near) zero area, then every vertex left
/// without a face.
///
/// Algorithms that need a face normal everywhere (SDF, segmentation) run this first.
pub fn remove_degenerate_faces(mesh: &mut SurfaceMesh) -> Result<Cleanup> {
    let degenerate: Vec<_> = mesh
        .faces()
        .filter(|&f| {
            let [a, b, c] = mesh.face_vertices(f);
            a == b || b == c || a == c || mesh.triangle(f).area() < DEGENERATE_AREA
        })
        .collect();
    for &f in &degenerate {
        mesh.remove_face(f)?;
    }

    let isolated: Vec<_> = mesh
        .vertices()
        .filter(|&v| mesh.faces_around_vertex(v).is_empty())
        .collect();
    for &v in &isolated {
        mesh.remove_vertex(v)?;
    }

    let cleanup = Cleanup {
        faces_removed: degenerate.len(),
        vertices_removed: isolated.len(),
    };
    if cleanup != Cleanup::default() {
        debug!(
            "removed {} degenerate faces and {} isolated vertices",
            cleanup.faces_removed, cleanup.vertices_removed
        );
    }
    Ok(cleanup)
}

#[cfg(test)]
mod tests {
    use meshbridge_mesh::{decode, MeshDescriptor};
    use meshbridge_test_data::{CUBE, CUBE_WITH_DEGENERATE_FACE};

    use super::*;

    #[test]
    fn clean_mesh_is_untouched() {
        let desc = MeshDescriptor::new(CUBE.vertices.to_vec(), CUBE.faces.to_vec());
        let mut mesh = decode(&desc).unwrap();
        let revision = mesh.revision();
        assert_eq!(remove_degenerate_faces(&mut mesh).unwrap(), Cleanup::default());
        assert_eq!(mesh.revision(), revision);
    }

    #[test]
    fn removes_repeated_corner_and_isolated_vertex() {
        let model = &CUBE_WITH_DEGENERATE_FACE;
        let desc = MeshDescriptor::new(model.vertices.to_vec(), model.faces.to_vec());
        let mut mesh = decode(&desc).unwrap();

        let cleanup = remove_degenerate_faces(&mut mesh).unwrap();
        assert_eq!(
            cleanup,
            Cleanup {
                faces_removed: 1,
                vertices_removed: 1,
            }
        );
        assert_eq!(mesh.number_of_faces(), 12);
        assert_eq!(mesh.number_of_vertices(), 8);
    }

    #[test]
    fn removes_zero_area_face() {
        // Three collinear points.
        let desc = MeshDescriptor::new(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 2.0, 0.0, 0.0],
            vec![0, 1, 2],
        );
        let mut mesh = decode(&desc).unwrap();
        let cleanup = remove_degenerate_faces(&mut mesh).unwrap();
        assert_eq!(cleanup.faces_removed, 1);
        assert_eq!(cleanup.vertices_removed, 3);
        assert!(mesh.is_empty());
    }
}
