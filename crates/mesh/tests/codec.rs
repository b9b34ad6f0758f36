use meshbridge_mesh::{
    build_reindexing, decode, encode, encode_faces, encode_vertices, MeshDescriptor, MeshError,
    Vector3,
};
use meshbridge_test_data::{TestModel, CUBE, OCTAHEDRON, TETRAHEDRON};

fn descriptor(model: &TestModel) -> MeshDescriptor {
    MeshDescriptor::new(model.vertices.to_vec(), model.faces.to_vec())
}

#[test]
fn round_trip_reproduces_input() {
    for model in [&TETRAHEDRON, &CUBE, &OCTAHEDRON] {
        let desc = descriptor(model);
        let mesh = decode(&desc).unwrap();
        let reindexing = build_reindexing(&mesh);

        assert_eq!(encode_vertices(&mesh), desc.vertices);
        assert_eq!(encode_faces(&mesh, &reindexing).unwrap(), desc.faces);
        assert_eq!(encode(&mesh).unwrap(), desc);
    }
}

#[test]
fn malformed_vertex_array() {
    let desc = MeshDescriptor::new(vec![0.0; 8], vec![]);
    assert_eq!(decode(&desc).unwrap_err(), MeshError::VertexArrayLength(8));
}

#[test]
fn reindexing_is_dense_after_removal() {
    let mut mesh = decode(&descriptor(&OCTAHEDRON)).unwrap();
    let n = mesh.number_of_vertices();

    // Collapse two edges: each removes one vertex.
    let v: Vec<_> = mesh.vertices().collect();
    mesh.collapse_edge(v[0], v[2], Vector3::new(0.5, 0.5, 0.0)).unwrap();
    mesh.collapse_edge(v[0], v[4], Vector3::new(0.25, 0.25, 0.5)).unwrap();
    let k = 2;

    let reindexing = build_reindexing(&mesh);
    assert_eq!(reindexing.len(), n - k);
    let mut indices: Vec<u32> = mesh
        .vertices()
        .map(|v| reindexing.get(v).unwrap())
        .collect();
    indices.sort_unstable();
    assert_eq!(indices, (0..(n - k) as u32).collect::<Vec<_>>());
    assert!(!reindexing.is_identity());
    assert_eq!(reindexing.get(v[2]), None);
}

#[test]
fn encoded_faces_stay_in_bounds() {
    let mut mesh = decode(&descriptor(&OCTAHEDRON)).unwrap();
    let v: Vec<_> = mesh.vertices().collect();
    mesh.collapse_edge(v[1], v[3], Vector3::new(-0.5, -0.5, 0.0)).unwrap();

    let out = encode(&mesh).unwrap();
    let vertex_count = out.vertex_count() as u32;
    assert_eq!(vertex_count, 5);
    assert_eq!(out.face_count(), 6);
    assert!(out.faces.iter().all(|&i| i < vertex_count));
    out.validate().unwrap();
}
