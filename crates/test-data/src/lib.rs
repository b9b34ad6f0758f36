/// A small mesh stored the way hosts send it: flat coordinates and flat indices.
pub struct TestModel {
    pub vertices: &'static [f64],
    pub faces: &'static [u32],
    pub surface_area: f64,
}

impl TestModel {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn face_count(&self) -> usize {
        self.faces.len() / 3
    }
}

/// The four sided pyramid used by the `test` operation. The winding is not
/// consistent, which is fine for operations that ignore orientation.
pub const TETRAHEDRON: TestModel = TestModel {
    vertices: &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.5, 1.0, 0.0, 0.5, 0.5, 1.0],
    faces: &[0, 1, 2, 3, 1, 2, 3, 0, 2, 0, 1, 3],
    // 0.5 + 2 * sqrt(1.3125)/2 + sqrt(1.25)/2
    surface_area: 2.204_660_918_113_907,
};

/// Unit cube, outward counter-clockwise winding.
pub const CUBE: TestModel = TestModel {
    vertices: &[
        0.0, 0.0, 0.0, //
        1.0, 0.0, 0.0, //
        1.0, 1.0, 0.0, //
        0.0, 1.0, 0.0, //
        0.0, 0.0, 1.0, //
        1.0, 0.0, 1.0, //
        1.0, 1.0, 1.0, //
        0.0, 1.0, 1.0, //
    ],
    faces: &[
        0, 2, 1, 0, 3, 2, // bottom
        4, 5, 6, 4, 6, 7, // top
        0, 1, 5, 0, 5, 4, // front
        3, 7, 6, 3, 6, 2, // back
        0, 4, 7, 0, 7, 3, // left
        1, 2, 6, 1, 6, 5, // right
    ],
    surface_area: 6.0,
};

/// Regular octahedron with vertices on the unit axes, outward winding.
pub const OCTAHEDRON: TestModel = TestModel {
    vertices: &[
        1.0, 0.0, 0.0, //
        -1.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, //
        0.0, -1.0, 0.0, //
        0.0, 0.0, 1.0, //
        0.0, 0.0, -1.0, //
    ],
    faces: &[
        0, 2, 4, 2, 1, 4, 1, 3, 4, 3, 0, 4, //
        2, 0, 5, 1, 2, 5, 3, 1, 5, 0, 3, 5, //
    ],
    // 8 equilateral triangles with side sqrt(2).
    surface_area: 6.928_203_230_275_509,
};

/// [`CUBE`] plus one face that repeats a corner and one vertex no face uses.
pub const CUBE_WITH_DEGENERATE_FACE: TestModel = TestModel {
    vertices: &[
        0.0, 0.0, 0.0, //
        1.0, 0.0, 0.0, //
        1.0, 1.0, 0.0, //
        0.0, 1.0, 0.0, //
        0.0, 0.0, 1.0, //
        1.0, 0.0, 1.0, //
        1.0, 1.0, 1.0, //
        0.0, 1.0, 1.0, //
        5.0, 5.0, 5.0, //
    ],
    faces: &[
        0, 2, 1, 0, 3, 2, //
        4, 5, 6, 4, 6, 7, //
        0, 1, 5, 0, 5, 4, //
        3, 7, 6, 3, 6, 2, //
        0, 4, 7, 0, 7, 3, //
        1, 2, 6, 1, 6, 5, //
        6, 6, 5, //
    ],
    surface_area: 6.0,
};
