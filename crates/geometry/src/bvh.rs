//! Bounding volume hierarchy over the faces of a mesh.
//!
//! Boxes are split at the median centroid along their longest axis until a leaf
//! holds at most [`LEAF_SIZE`] triangles, so a ray only tests the triangles whose
//! boxes it actually crosses.

use cgmath::InnerSpace;
use meshbridge_mesh::{FaceId, SurfaceMesh, Triangle, Vector3};

const LEAF_SIZE: usize = 4;

// Boxes are padded so flat, axis aligned triangles still have a volume to enter.
const BOX_PADDING: f64 = 1e-9;

const RAY_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy)]
struct Aabb {
    min: Vector3,
    max: Vector3,
}

impl Aabb {
    fn empty() -> Self {
        Self {
            min: Vector3::new(f64::MAX, f64::MAX, f64::MAX),
            max: Vector3::new(f64::MIN, f64::MIN, f64::MIN),
        }
    }

    fn expand_point(&mut self, p: Vector3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    fn expand_triangle(&mut self, t: &Triangle) {
        for p in [t.p0, t.p1, t.p2] {
            self.expand_point(p);
        }
    }

    fn padded(self, padding: f64) -> Self {
        let pad = Vector3::new(padding, padding, padding);
        Self {
            min: self.min - pad,
            max: self.max + pad,
        }
    }

    fn longest_axis(&self) -> usize {
        let d = self.max - self.min;
        if d.x >= d.y && d.x >= d.z {
            0
        } else if d.y >= d.z {
            1
        } else {
            2
        }
    }

    // Slab test. Returns the distance at which the ray enters the box.
    fn ray_entry(&self, origin: Vector3, dir_inv: Vector3) -> Option<f64> {
        let t1 = (self.min.x - origin.x) * dir_inv.x;
        let t2 = (self.max.x - origin.x) * dir_inv.x;
        let t3 = (self.min.y - origin.y) * dir_inv.y;
        let t4 = (self.max.y - origin.y) * dir_inv.y;
        let t5 = (self.min.z - origin.z) * dir_inv.z;
        let t6 = (self.max.z - origin.z) * dir_inv.z;

        let t_min = t1.min(t2).max(t3.min(t4)).max(t5.min(t6));
        let t_max = t1.max(t2).min(t3.max(t4)).min(t5.max(t6));
        (t_max >= t_min && t_max >= 0.0).then_some(t_min.max(0.0))
    }
}

#[derive(Debug)]
enum Node {
    Leaf {
        bbox: Aabb,
        items: Vec<usize>,
    },
    Internal {
        bbox: Aabb,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn build(triangles: &[(FaceId, Triangle)], centroids: &[Vector3], items: &mut [usize]) -> Self {
        let mut bbox = Aabb::empty();
        for &i in items.iter() {
            bbox.expand_triangle(&triangles[i].1);
        }
        let bbox = bbox.padded(BOX_PADDING);
        if items.len() <= LEAF_SIZE {
            return Node::Leaf {
                bbox,
                items: items.to_vec(),
            };
        }

        let axis = bbox.longest_axis();
        items.sort_by(|&a, &b| centroids[a][axis].total_cmp(&centroids[b][axis]));
        let (left, right) = items.split_at_mut(items.len() / 2);
        Node::Internal {
            bbox,
            left: Box::new(Node::build(triangles, centroids, left)),
            right: Box::new(Node::build(triangles, centroids, right)),
        }
    }

    fn bbox(&self) -> &Aabb {
        match self {
            Node::Leaf { bbox, .. } | Node::Internal { bbox, .. } => bbox,
        }
    }

    #[cfg(test)]
    fn depth(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Internal { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

/// The first triangle a ray meets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub face: FaceId,
    pub triangle: Triangle,
    pub distance: f64,
}

/// Ray queries against the live faces of a mesh.
///
/// Built once from a snapshot; later edits to the mesh are not seen.
#[derive(Debug)]
pub struct FaceBvh {
    triangles: Vec<(FaceId, Triangle)>,
    root: Option<Node>,
}

impl FaceBvh {
    pub fn new(mesh: &SurfaceMesh) -> Self {
        let triangles: Vec<(FaceId, Triangle)> =
            mesh.faces().map(|f| (f, mesh.triangle(f))).collect();
        let centroids: Vec<Vector3> = triangles.iter().map(|(_, t)| t.centroid()).collect();
        let mut items: Vec<usize> = (0..triangles.len()).collect();
        let root = (!items.is_empty()).then(|| Node::build(&triangles, &centroids, &mut items));
        Self { triangles, root }
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// The live faces in ascending handle order, with their geometry.
    pub fn triangles(&self) -> &[(FaceId, Triangle)] {
        &self.triangles
    }

    /// Closest triangle hit by the ray from `origin` along `dir`, ignoring `skip`.
    ///
    /// Hits at equal distance go to the lower face handle.
    pub fn closest_hit(&self, origin: Vector3, dir: Vector3, skip: FaceId) -> Option<RayHit> {
        let root = self.root.as_ref()?;
        let dir_inv = Vector3::new(1.0 / dir.x, 1.0 / dir.y, 1.0 / dir.z);

        let mut best: Option<(f64, usize)> = None;
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            match node.bbox().ray_entry(origin, dir_inv) {
                Some(t) if best.map_or(true, |(d, _)| t <= d) => (),
                _ => continue,
            }
            match node {
                Node::Leaf { items, .. } => {
                    for &i in items {
                        let (f, t) = &self.triangles[i];
                        if *f == skip {
                            continue;
                        }
                        let Some(d) = intersect(origin, dir, t) else {
                            continue;
                        };
                        if best.map_or(true, |(b, j)| d < b || (d == b && i < j)) {
                            best = Some((d, i));
                        }
                    }
                }
                Node::Internal { left, right, .. } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }

        best.map(|(distance, i)| {
            let (face, triangle) = self.triangles[i];
            RayHit {
                face,
                triangle,
                distance,
            }
        })
    }

    #[cfg(test)]
    fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, Node::depth)
    }

    // Triangles in the leaves whose boxes the ray enters.
    #[cfg(test)]
    fn candidates(&self, origin: Vector3, dir: Vector3) -> usize {
        let dir_inv = Vector3::new(1.0 / dir.x, 1.0 / dir.y, 1.0 / dir.z);
        let mut count = 0;
        let mut stack: Vec<&Node> = self.root.iter().collect();
        while let Some(node) = stack.pop() {
            if node.bbox().ray_entry(origin, dir_inv).is_none() {
                continue;
            }
            match node {
                Node::Leaf { items, .. } => count += items.len(),
                Node::Internal { left, right, .. } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        count
    }
}

// Moller-Trumbore ray/triangle intersection, as a distance along `dir`.
pub(crate) fn intersect(origin: Vector3, dir: Vector3, t: &Triangle) -> Option<f64> {
    let e1 = t.p1 - t.p0;
    let e2 = t.p2 - t.p0;
    let p = dir.cross(e2);
    let det = e1.dot(p);
    if det.abs() < RAY_EPSILON {
        return None;
    }
    let inv = 1.0 / det;
    let s = origin - t.p0;
    let u = s.dot(p) * inv;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(e1);
    let v = dir.dot(q) * inv;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let d = e2.dot(q) * inv;
    (d > RAY_EPSILON).then_some(d)
}

#[cfg(test)]
mod tests {
    use float_eq::assert_float_eq;
    use meshbridge_mesh::{decode, MeshDescriptor};
    use meshbridge_test_data::{TestModel, CUBE, OCTAHEDRON};

    use super::*;

    fn mesh(model: &TestModel) -> SurfaceMesh {
        decode(&MeshDescriptor::new(
            model.vertices.to_vec(),
            model.faces.to_vec(),
        ))
        .unwrap()
    }

    // An n by n grid of unit squares in the z = 0 plane, two triangles each.
    fn grid(n: u32) -> SurfaceMesh {
        let side = n + 1;
        let mut vertices = Vec::new();
        for y in 0..side {
            for x in 0..side {
                vertices.extend([f64::from(x), f64::from(y), 0.0]);
            }
        }
        let mut faces = Vec::new();
        for y in 0..n {
            for x in 0..n {
                let a = y * side + x;
                faces.extend([a, a + 1, a + side + 1, a, a + side + 1, a + side]);
            }
        }
        decode(&MeshDescriptor::new(vertices, faces)).unwrap()
    }

    fn linear_hit(bvh: &FaceBvh, origin: Vector3, dir: Vector3, skip: FaceId) -> Option<(FaceId, f64)> {
        let mut best: Option<(FaceId, f64)> = None;
        for (f, t) in bvh.triangles() {
            if *f == skip {
                continue;
            }
            if let Some(d) = intersect(origin, dir, t) {
                if best.map_or(true, |(_, b)| d < b) {
                    best = Some((*f, d));
                }
            }
        }
        best
    }

    #[test]
    fn ray_hits_triangle() {
        let t = Triangle {
            p0: Vector3::new(0.0, 0.0, 1.0),
            p1: Vector3::new(1.0, 0.0, 1.0),
            p2: Vector3::new(0.0, 1.0, 1.0),
        };
        let origin = Vector3::new(0.2, 0.2, 0.0);
        let hit = intersect(origin, Vector3::new(0.0, 0.0, 1.0), &t).unwrap();
        assert_float_eq!(hit, 1.0, abs <= 1e-12);
        assert_eq!(intersect(origin, Vector3::new(0.0, 0.0, -1.0), &t), None);
        assert_eq!(intersect(origin, Vector3::new(1.0, 0.0, 0.0), &t), None);
    }

    #[test]
    fn matches_a_linear_scan() {
        for model in [&CUBE, &OCTAHEDRON] {
            let m = mesh(model);
            let bvh = FaceBvh::new(&m);
            assert_eq!(bvh.len(), model.face_count());
            for (f, t) in bvh.triangles() {
                let origin = t.centroid();
                let inward = -t.normal().unwrap();
                for dir in [
                    inward,
                    (inward + Vector3::new(0.3, -0.2, 0.1)).normalize(),
                    (inward + Vector3::new(-0.25, 0.4, 0.35)).normalize(),
                ] {
                    let hit = bvh.closest_hit(origin, dir, *f);
                    let expected = linear_hit(&bvh, origin, dir, *f);
                    assert_eq!(hit.map(|h| (h.face, h.distance)), expected);
                }
            }
        }
    }

    #[test]
    fn skips_the_source_face() {
        let m = grid(1);
        let bvh = FaceBvh::new(&m);
        let (first, t) = bvh.triangles()[0];
        let origin = t.centroid() + Vector3::new(0.0, 0.0, 1.0);
        let down = Vector3::new(0.0, 0.0, -1.0);
        let hit = bvh.closest_hit(origin, down, bvh.triangles()[1].0);
        assert_eq!(hit.map(|h| h.face), Some(first));
        assert_float_eq!(hit.unwrap().distance, 1.0, abs <= 1e-12);
        assert_eq!(bvh.closest_hit(origin, down, first), None);
    }

    #[test]
    fn ray_touches_few_triangles() {
        let m = grid(40);
        let bvh = FaceBvh::new(&m);
        assert_eq!(bvh.len(), 3200);
        // 3200 faces in leaves of at most 4 need about log2(800) levels.
        assert!(bvh.depth() <= 12, "{}", bvh.depth());

        let origin = Vector3::new(17.3, 22.6, 5.0);
        let down = Vector3::new(0.0, 0.0, -1.0);
        let candidates = bvh.candidates(origin, down);
        assert!(candidates < bvh.len() / 20, "{}", candidates);
        let (f, _) = bvh.triangles()[0];
        let hit = bvh.closest_hit(origin, down, f).unwrap();
        assert_float_eq!(hit.distance, 5.0, abs <= 1e-12);
        let c = hit.triangle.centroid();
        assert!((c.x - 17.5).abs() < 0.5 && (c.y - 22.5).abs() < 0.5, "{:?}", c);
    }

    #[test]
    fn empty_mesh_has_no_hits() {
        let bvh = FaceBvh::new(&SurfaceMesh::new());
        assert!(bvh.is_empty());
        let mesh = grid(1);
        let f = mesh.faces().next().unwrap();
        assert_eq!(
            bvh.closest_hit(Vector3::new(0.0, 0.0, 1.0), Vector3::new(0.0, 0.0, -1.0), f),
            None
        );
    }
}
