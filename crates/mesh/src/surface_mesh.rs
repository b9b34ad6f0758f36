use std::fmt;

use crate::{MeshError, Result, Triangle, Vector3};

/// Stable handle to a vertex of a [`SurfaceMesh`].
///
/// Handles are handed out in creation order and are never reused, even after the
/// vertex is removed, so a handle always refers to the same logical vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(u32);

/// Stable handle to a face of a [`SurfaceMesh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaceId(u32);

impl VertexId {
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

impl FaceId {
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// Indexed triangle mesh that supports removing elements.
///
/// Removal only marks an element as dead; storage is never compacted, which is what
/// keeps handles stable. Iteration skips dead elements and always visits live ones
/// in ascending handle order, and that order is what the codec uses to lay out the
/// output arrays.
///
/// Every change to the vertex set bumps [`SurfaceMesh::revision`].
#[derive(Debug, Clone, Default)]
pub struct SurfaceMesh {
    points: Vec<Vector3>,
    vertex_removed: Vec<bool>,
    // Faces incident to each vertex, kept in sync by add_face/remove_face.
    vertex_faces: Vec<Vec<FaceId>>,
    faces: Vec<[VertexId; 3]>,
    face_removed: Vec<bool>,
    removed_vertices: usize,
    removed_faces: usize,
    revision: u64,
}

impl SurfaceMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize, faces: usize) -> Self {
        Self {
            points: Vec::with_capacity(vertices),
            vertex_removed: Vec::with_capacity(vertices),
            vertex_faces: Vec::with_capacity(vertices),
            faces: Vec::with_capacity(faces),
            face_removed: Vec::with_capacity(faces),
            ..Self::default()
        }
    }

    /// Fails when every `u32` handle has been issued.
    pub fn add_vertex(&mut self, point: Vector3) -> Result<VertexId> {
        let id = VertexId(next_handle(self.points.len(), "vertices")?);
        self.points.push(point);
        self.vertex_removed.push(false);
        self.vertex_faces.push(Vec::new());
        self.revision += 1;
        Ok(id)
    }

    pub fn add_face(&mut self, v0: VertexId, v1: VertexId, v2: VertexId) -> Result<FaceId> {
        for v in [v0, v1, v2] {
            self.check_vertex(v)?;
        }
        let id = FaceId(next_handle(self.faces.len(), "faces")?);
        self.faces.push([v0, v1, v2]);
        self.face_removed.push(false);
        for v in [v0, v1, v2] {
            let incident = &mut self.vertex_faces[v.idx()];
            // A face with a repeated corner is only listed once per vertex.
            if !incident.contains(&id) {
                incident.push(id);
            }
        }
        Ok(id)
    }

    pub fn remove_face(&mut self, f: FaceId) -> Result<()> {
        self.check_face(f)?;
        self.face_removed[f.idx()] = true;
        self.removed_faces += 1;
        for v in self.faces[f.idx()] {
            self.vertex_faces[v.idx()].retain(|&g| g != f);
        }
        Ok(())
    }

    /// Removes an isolated vertex. Fails if any live face still uses it.
    pub fn remove_vertex(&mut self, v: VertexId) -> Result<()> {
        self.check_vertex(v)?;
        let faces = self.vertex_faces[v.idx()].len();
        if faces > 0 {
            return Err(MeshError::VertexInUse { vertex: v, faces });
        }
        self.vertex_removed[v.idx()] = true;
        self.removed_vertices += 1;
        self.revision += 1;
        Ok(())
    }

    /// Merges `remove` into `keep` and moves `keep` to `position`.
    ///
    /// Faces that contain both vertices vanish; every other face that used `remove`
    /// now uses `keep`. Returns the faces that were removed. Validity checks (link
    /// condition, flips) are left to the caller.
    pub fn collapse_edge(
        &mut self,
        keep: VertexId,
        remove: VertexId,
        position: Vector3,
    ) -> Result<Vec<FaceId>> {
        self.check_vertex(keep)?;
        self.check_vertex(remove)?;
        if keep == remove {
            return Err(MeshError::DegenerateCollapse(keep));
        }

        let mut removed = Vec::new();
        for f in self.vertex_faces[remove.idx()].clone() {
            if self.faces[f.idx()].contains(&keep) {
                self.remove_face(f)?;
                removed.push(f);
            } else {
                for corner in self.faces[f.idx()].iter_mut() {
                    if *corner == remove {
                        *corner = keep;
                    }
                }
                self.vertex_faces[keep.idx()].push(f);
            }
        }
        self.vertex_faces[remove.idx()].clear();
        self.remove_vertex(remove)?;
        self.points[keep.idx()] = position;
        Ok(removed)
    }

    pub fn is_vertex_live(&self, v: VertexId) -> bool {
        self.vertex_removed.get(v.idx()).map_or(false, |removed| !removed)
    }

    pub fn is_face_live(&self, f: FaceId) -> bool {
        self.face_removed.get(f.idx()).map_or(false, |removed| !removed)
    }

    pub fn number_of_vertices(&self) -> usize {
        self.points.len() - self.removed_vertices
    }

    pub fn number_of_faces(&self) -> usize {
        self.faces.len() - self.removed_faces
    }

    pub fn is_empty(&self) -> bool {
        self.number_of_vertices() == 0
    }

    /// Live vertices in ascending handle order.
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertex_removed
            .iter()
            .enumerate()
            .filter(|(_, removed)| !**removed)
            .map(|(i, _)| VertexId(i as u32))
    }

    /// Live faces in ascending handle order.
    pub fn faces(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.face_removed
            .iter()
            .enumerate()
            .filter(|(_, removed)| !**removed)
            .map(|(i, _)| FaceId(i as u32))
    }

    /// Upper bound (exclusive) of every face handle ever issued.
    pub fn face_capacity(&self) -> usize {
        self.faces.len()
    }

    pub fn point(&self, v: VertexId) -> Vector3 {
        self.points[v.idx()]
    }

    pub fn set_point(&mut self, v: VertexId, point: Vector3) {
        self.points[v.idx()] = point;
    }

    pub fn face_vertices(&self, f: FaceId) -> [VertexId; 3] {
        self.faces[f.idx()]
    }

    pub fn triangle(&self, f: FaceId) -> Triangle {
        let [a, b, c] = self.faces[f.idx()];
        Triangle {
            p0: self.point(a),
            p1: self.point(b),
            p2: self.point(c),
        }
    }

    pub fn faces_around_vertex(&self, v: VertexId) -> &[FaceId] {
        &self.vertex_faces[v.idx()]
    }

    /// Vertices sharing a live face with `v`, sorted and without duplicates.
    pub fn vertices_around_vertex(&self, v: VertexId) -> Vec<VertexId> {
        let mut neighbors: Vec<VertexId> = self.vertex_faces[v.idx()]
            .iter()
            .flat_map(|f| self.faces[f.idx()])
            .filter(|&u| u != v)
            .collect();
        neighbors.sort_unstable();
        neighbors.dedup();
        neighbors
    }

    /// Undirected edges of the live faces, each as `(low, high)`, sorted.
    pub fn edges(&self) -> Vec<(VertexId, VertexId)> {
        let mut edges: Vec<(VertexId, VertexId)> = self
            .faces()
            .flat_map(|f| {
                let [a, b, c] = self.faces[f.idx()];
                [(a, b), (b, c), (c, a)]
            })
            .filter(|(a, b)| a != b)
            .map(|(a, b)| if a < b { (a, b) } else { (b, a) })
            .collect();
        edges.sort_unstable();
        edges.dedup();
        edges
    }

    pub fn number_of_edges(&self) -> usize {
        self.edges().len()
    }

    /// Counter bumped whenever a vertex is added or removed.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn check_vertex(&self, v: VertexId) -> Result<()> {
        if self.is_vertex_live(v) {
            Ok(())
        } else {
            Err(MeshError::DeadVertex(v))
        }
    }

    fn check_face(&self, f: FaceId) -> Result<()> {
        if self.is_face_live(f) {
            Ok(())
        } else {
            Err(MeshError::DeadFace(f))
        }
    }
}

// Handles are `u32`; every handle ever issued fits, so the iterators below can
// narrow their positions without checking.
fn next_handle(issued: usize, what: &'static str) -> Result<u32> {
    u32::try_from(issued).map_err(|_| MeshError::TooLarge(what))
}

/// Per-face values addressed by [`FaceId`].
///
/// Sized to the mesh's face capacity, so entries for removed faces exist but are
/// meaningless.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceProperty<T> {
    values: Vec<T>,
}

impl<T: Clone> FaceProperty<T> {
    pub fn new(mesh: &SurfaceMesh, initial: T) -> Self {
        Self {
            values: vec![initial; mesh.face_capacity()],
        }
    }
}

impl<T> FaceProperty<T> {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<T> std::ops::Index<FaceId> for FaceProperty<T> {
    type Output = T;

    fn index(&self, f: FaceId) -> &T {
        &self.values[f.idx()]
    }
}

impl<T> std::ops::IndexMut<FaceId> for FaceProperty<T> {
    fn index_mut(&mut self, f: FaceId) -> &mut T {
        &mut self.values[f.idx()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> (SurfaceMesh, [VertexId; 4]) {
        //  3 --- 2
        //  |   / |
        //  |  /  |
        //  | /   |
        //  0 --- 1
        let mut mesh = SurfaceMesh::new();
        let v = [
            mesh.add_vertex(Vector3::new(0.0, 0.0, 0.0)).unwrap(),
            mesh.add_vertex(Vector3::new(1.0, 0.0, 0.0)).unwrap(),
            mesh.add_vertex(Vector3::new(1.0, 1.0, 0.0)).unwrap(),
            mesh.add_vertex(Vector3::new(0.0, 1.0, 0.0)).unwrap(),
        ];
        mesh.add_face(v[0], v[1], v[2]).unwrap();
        mesh.add_face(v[0], v[2], v[3]).unwrap();
        (mesh, v)
    }

    #[test]
    fn counts_and_edges() {
        let (mesh, v) = quad();
        assert_eq!(mesh.number_of_vertices(), 4);
        assert_eq!(mesh.number_of_faces(), 2);
        assert_eq!(mesh.number_of_edges(), 5);
        assert_eq!(mesh.vertices_around_vertex(v[0]), vec![v[1], v[2], v[3]]);
        assert_eq!(mesh.vertices_around_vertex(v[1]), vec![v[0], v[2]]);
    }

    #[test]
    fn removed_vertex_keeps_other_handles() {
        let (mut mesh, v) = quad();
        let f1 = mesh.faces().nth(1).unwrap();
        mesh.remove_face(f1).unwrap();
        mesh.remove_vertex(v[3]).unwrap();

        assert!(!mesh.is_vertex_live(v[3]));
        assert_eq!(mesh.vertices().collect::<Vec<_>>(), v[..3].to_vec());
        assert_eq!(mesh.point(v[2]), Vector3::new(1.0, 1.0, 0.0));
        // New vertices never reuse the dead handle.
        let v4 = mesh.add_vertex(Vector3::new(2.0, 2.0, 2.0)).unwrap();
        assert_eq!(v4.idx(), 4);
    }

    #[test]
    fn cannot_remove_vertex_in_use() {
        let (mut mesh, v) = quad();
        assert_eq!(
            mesh.remove_vertex(v[0]),
            Err(MeshError::VertexInUse {
                vertex: v[0],
                faces: 2
            })
        );
    }

    #[test]
    fn faces_must_use_live_vertices() {
        let (mut mesh, v) = quad();
        let f1 = mesh.faces().nth(1).unwrap();
        mesh.remove_face(f1).unwrap();
        mesh.remove_vertex(v[3]).unwrap();
        assert_eq!(
            mesh.add_face(v[0], v[1], v[3]),
            Err(MeshError::DeadVertex(v[3]))
        );
        assert_eq!(mesh.remove_face(f1), Err(MeshError::DeadFace(f1)));
    }

    #[test]
    fn collapse_edge_merges_vertices() {
        let (mut mesh, v) = quad();
        let revision = mesh.revision();
        // Edge 0-2 is shared by both faces, so both disappear.
        let removed = mesh
            .collapse_edge(v[0], v[2], Vector3::new(0.5, 0.5, 0.0))
            .unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(mesh.number_of_faces(), 0);
        assert_eq!(mesh.number_of_vertices(), 3);
        assert_eq!(mesh.point(v[0]), Vector3::new(0.5, 0.5, 0.0));
        assert!(mesh.revision() > revision);
    }

    #[test]
    fn collapse_edge_rewires_surviving_faces() {
        let (mut mesh, v) = quad();
        // Edge 2-3 only borders the second face; the first face now uses vertex 3.
        mesh.collapse_edge(v[3], v[2], Vector3::new(0.5, 1.0, 0.0)).unwrap();
        assert_eq!(mesh.number_of_faces(), 1);
        let f = mesh.faces().next().unwrap();
        assert_eq!(mesh.face_vertices(f), [v[0], v[1], v[3]]);
        assert!(mesh.faces_around_vertex(v[3]).contains(&f));
        assert_eq!(
            mesh.collapse_edge(v[3], v[3], Vector3::new(0.0, 0.0, 0.0)),
            Err(MeshError::DegenerateCollapse(v[3]))
        );
    }

    #[test]
    fn handles_stop_at_u32_max() {
        assert_eq!(next_handle(7, "vertices"), Ok(7));
        assert_eq!(next_handle(u32::MAX as usize, "faces"), Ok(u32::MAX));
        assert_eq!(
            next_handle(u32::MAX as usize + 1, "vertices"),
            Err(MeshError::TooLarge("vertices"))
        );
        assert_eq!(
            MeshError::TooLarge("faces").to_string(),
            "mesh has more faces than u32 handles can address"
        );
    }

    #[test]
    fn face_property_indexing() {
        let (mesh, _) = quad();
        let mut prop = FaceProperty::new(&mesh, 0usize);
        for (i, f) in mesh.faces().enumerate() {
            prop[f] = i + 10;
        }
        let f1 = mesh.faces().nth(1).unwrap();
        assert_eq!(prop[f1], 11);
        assert_eq!(prop.len(), 2);
    }
}
