use float_eq::assert_float_eq;
use meshbridge_geometry::{
    edge_collapse, remove_degenerate_faces, sdf_values, segmentation_from_sdf_values,
    surface_area, EdgeCountRatio, SdfParams,
};
use meshbridge_mesh::{decode, encode, MeshDescriptor, SurfaceMesh};
use meshbridge_test_data::{TestModel, CUBE, CUBE_WITH_DEGENERATE_FACE, OCTAHEDRON};

fn mesh(model: &TestModel) -> SurfaceMesh {
    decode(&MeshDescriptor::new(
        model.vertices.to_vec(),
        model.faces.to_vec(),
    ))
    .unwrap()
}

#[test]
fn segment_after_cleanup() {
    let mut m = mesh(&CUBE_WITH_DEGENERATE_FACE);
    let cleanup = remove_degenerate_faces(&mut m).unwrap();
    assert_eq!(cleanup.faces_removed, 1);
    assert_eq!(cleanup.vertices_removed, 1);

    let sdf = sdf_values(&m, &SdfParams::default()).unwrap();
    let seg = segmentation_from_sdf_values(&m, &sdf, 3, 0.26).unwrap();
    assert!(seg.number_of_segments >= 1);
    assert!(m.faces().all(|f| seg.segment_ids[f] < seg.number_of_segments));

    let out = encode(&m).unwrap();
    assert_eq!(out.face_count(), CUBE.face_count());
    assert_eq!(out.vertex_count(), CUBE.vertex_count());
}

#[test]
fn simplification_keeps_area_bounded() {
    let mut m = mesh(&OCTAHEDRON);
    let before = surface_area(&m);
    assert_float_eq!(before, OCTAHEDRON.surface_area, abs <= 1e-12);

    edge_collapse(&mut m, EdgeCountRatio(0.5)).unwrap();
    let after = surface_area(&m);
    assert!(after > 0.0);
    assert!(after < before);
}
