use cgmath::InnerSpace;
use meshbridge_mesh::{SurfaceMesh, Vector3};

/// Half the magnitude of `(b - a) x (c - a)`.
pub fn triangle_area(a: Vector3, b: Vector3, c: Vector3) -> f64 {
    (b - a).cross(c - a).magnitude() / 2.0
}

/// Sum of the areas of all live faces.
pub fn surface_area(mesh: &SurfaceMesh) -> f64 {
    mesh.faces()
        .map(|f| {
            let t = mesh.triangle(f);
            triangle_area(t.p0, t.p1, t.p2)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use float_eq::assert_float_eq;
    use meshbridge_mesh::{decode, MeshDescriptor};
    use meshbridge_test_data::{CUBE, OCTAHEDRON, TETRAHEDRON};

    use super::*;

    #[test]
    fn unit_right_triangle() {
        let area = triangle_area(
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        );
        assert_float_eq!(area, 0.5, abs <= 1e-12);
    }

    #[test]
    fn area_ignores_winding() {
        let a = Vector3::new(0.0, 0.0, 0.0);
        let b = Vector3::new(3.0, 0.0, 0.0);
        let c = Vector3::new(0.0, 4.0, 0.0);
        assert_float_eq!(triangle_area(a, b, c), triangle_area(a, c, b), abs <= 1e-12);
    }

    #[test]
    fn surface_area_of_fixtures() {
        for model in [&TETRAHEDRON, &CUBE, &OCTAHEDRON] {
            let desc = MeshDescriptor::new(model.vertices.to_vec(), model.faces.to_vec());
            let mesh = decode(&desc).unwrap();
            assert_float_eq!(surface_area(&mesh), model.surface_area, abs <= 1e-9);
        }
    }

    #[test]
    fn empty_mesh_has_no_area() {
        assert_eq!(surface_area(&SurfaceMesh::new()), 0.0);
    }
}
