use std::io::Cursor;

use float_eq::assert_float_eq;
use meshbridge_mesh::{MeshDescriptor, Triangle, Vector3};
use meshbridge_stl::{parse_stl, StlReader, StlWriter};
use meshbridge_test_data::{CUBE, OCTAHEDRON};

fn area(mesh: &MeshDescriptor) -> f64 {
    let point = |i: u32| {
        let p = &mesh.vertices[i as usize * 3..i as usize * 3 + 3];
        Vector3::new(p[0], p[1], p[2])
    };
    mesh.faces
        .chunks_exact(3)
        .map(|f| {
            Triangle {
                p0: point(f[0]),
                p1: point(f[1]),
                p2: point(f[2]),
            }
            .area()
        })
        .sum()
}

#[test]
fn cube_round_trip() {
    let cube = MeshDescriptor::new(CUBE.vertices.to_vec(), CUBE.faces.to_vec());
    let mut bytes: Vec<u8> = Vec::new();
    bytes.write_stl(&cube).unwrap();
    // 80 byte header, count, 50 bytes per triangle.
    assert_eq!(bytes.len(), 84 + 12 * 50);

    let mesh = Cursor::new(bytes).read_stl().unwrap();
    assert_eq!(mesh.face_count(), 12);
    assert_eq!(mesh.vertex_count(), 8);
    mesh.validate().unwrap();
    assert_float_eq!(area(&mesh), CUBE.surface_area, abs <= 1e-9);
}

#[test]
fn octahedron_keeps_topology() {
    let octahedron = MeshDescriptor::new(OCTAHEDRON.vertices.to_vec(), OCTAHEDRON.faces.to_vec());
    let mut bytes: Vec<u8> = Vec::new();
    bytes.write_stl(&octahedron).unwrap();

    let mesh = parse_stl(&bytes).unwrap();
    assert_eq!(mesh.vertex_count(), 6);
    assert_eq!(mesh.face_count(), 8);
    assert_float_eq!(area(&mesh), OCTAHEDRON.surface_area, abs <= 1e-6);
}

#[test]
fn empty_file_is_an_error() {
    assert!(parse_stl(&[]).is_err());
}
