//! Edge collapse simplification.
//!
//! Edges are collapsed shortest first onto their midpoint until the number of
//! undirected edges drops to the requested fraction of the original count. A
//! collapse is only performed when it keeps the surface a manifold without flipped
//! triangles; rejected edges are retried whenever their neighborhood changes.

use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap};
use std::fmt;
use std::time::Instant;

use cgmath::InnerSpace;
use log::{debug, info};
use meshbridge_mesh::{SurfaceMesh, Triangle, Vector3, VertexId};

use crate::{is_boundary_vertex, GeometryError, Result};

/// Stop once `edges <= floor(initial_edges * ratio)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeCountRatio(pub f64);

impl EdgeCountRatio {
    fn validate(self) -> Result<Self> {
        if self.0.is_finite() && self.0 > 0.0 && self.0 <= 1.0 {
            Ok(self)
        } else {
            Err(GeometryError::invalid_argument(
                "edge count ratio",
                self.0,
                "must be in (0, 1]",
            ))
        }
    }

    fn target(self, initial_edges: usize) -> usize {
        (initial_edges as f64 * self.0).floor() as usize
    }
}

/// Statistics of one [`edge_collapse`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollapseStats {
    pub initial_edges: usize,
    pub final_edges: usize,
    pub collapses: usize,
    pub rejected: usize,
}

impl CollapseStats {
    pub fn edges_removed(&self) -> usize {
        self.initial_edges - self.final_edges
    }
}

impl fmt::Display for CollapseStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} edges removed, {} final edges ({} collapses, {} rejected)",
            self.edges_removed(),
            self.final_edges,
            self.collapses,
            self.rejected
        )
    }
}

#[derive(Debug)]
struct Candidate {
    cost: f64,
    a: VertexId,
    b: VertexId,
    // Versions of both endpoints when the candidate was queued.
    stamp: (u32, u32),
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap pops the cheapest edge, lowest handles first on ties.
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| (other.a, other.b).cmp(&(self.a, self.b)))
    }
}

struct Queue {
    heap: BinaryHeap<Candidate>,
    stamps: Vec<u32>,
}

impl Queue {
    fn push(&mut self, mesh: &SurfaceMesh, a: VertexId, b: VertexId) {
        let (a, b) = if a < b { (a, b) } else { (b, a) };
        self.heap.push(Candidate {
            cost: (mesh.point(a) - mesh.point(b)).magnitude2(),
            a,
            b,
            stamp: (self.stamps[a.idx()], self.stamps[b.idx()]),
        });
    }

    fn is_current(&self, c: &Candidate) -> bool {
        c.stamp == (self.stamps[c.a.idx()], self.stamps[c.b.idx()])
    }
}

/// Collapses edges until the edge count reaches the ratio in `stop`.
///
/// Ratio `1.0` leaves the mesh untouched. The run may stop early when no remaining
/// edge can be collapsed safely.
pub fn edge_collapse(mesh: &mut SurfaceMesh, stop: EdgeCountRatio) -> Result<CollapseStats> {
    let stop = stop.validate()?;
    if mesh.number_of_faces() == 0 {
        return Err(GeometryError::NoFaces);
    }

    let start = Instant::now();
    let initial_edges = mesh.number_of_edges();
    let target = stop.target(initial_edges);
    let mut stats = CollapseStats {
        initial_edges,
        final_edges: initial_edges,
        collapses: 0,
        rejected: 0,
    };

    let capacity = mesh.vertices().last().map_or(0, |v| v.idx() + 1);
    let mut queue = Queue {
        heap: BinaryHeap::new(),
        stamps: vec![0; capacity],
    };
    for (a, b) in mesh.edges() {
        queue.push(mesh, a, b);
    }

    while stats.final_edges > target {
        let Some(candidate) = queue.heap.pop() else {
            break;
        };
        let (a, b) = (candidate.a, candidate.b);
        if !mesh.is_vertex_live(a) || !mesh.is_vertex_live(b) || !queue.is_current(&candidate) {
            continue;
        }

        let midpoint = (mesh.point(a) + mesh.point(b)) / 2.0;
        if !is_collapse_valid(mesh, a, b, midpoint) {
            stats.rejected += 1;
            continue;
        }

        let before = local_edge_count(mesh, &[a, b]);
        mesh.collapse_edge(a, b, midpoint)?;
        let after = local_edge_count(mesh, &[a]);
        stats.final_edges -= before - after;
        stats.collapses += 1;

        // Edges around `a` changed length and their neighbors' validity may have
        // changed too, so requeue every edge touching the one-ring.
        let ring = mesh.vertices_around_vertex(a);
        queue.stamps[a.idx()] += 1;
        for c in &ring {
            queue.stamps[c.idx()] += 1;
        }
        let mut requeue = BTreeSet::new();
        for &c in &ring {
            for d in mesh.vertices_around_vertex(c) {
                requeue.insert(if c < d { (c, d) } else { (d, c) });
            }
        }
        for (u, v) in requeue {
            queue.push(mesh, u, v);
        }
    }

    info!("edge collapse: {} in {:?}", stats, start.elapsed());
    Ok(stats)
}

// Number of distinct edges touching any vertex in `around`.
fn local_edge_count(mesh: &SurfaceMesh, around: &[VertexId]) -> usize {
    let mut edges: Vec<(VertexId, VertexId)> = around
        .iter()
        .flat_map(|&v| mesh.vertices_around_vertex(v).into_iter().map(move |u| (v, u)))
        .map(|(v, u)| if v < u { (v, u) } else { (u, v) })
        .collect();
    edges.sort_unstable();
    edges.dedup();
    edges.len()
}

fn is_collapse_valid(mesh: &SurfaceMesh, a: VertexId, b: VertexId, position: Vector3) -> bool {
    let shared: Vec<_> = mesh
        .faces_around_vertex(a)
        .iter()
        .copied()
        .filter(|&f| mesh.face_vertices(f).contains(&b))
        .collect();
    if shared.is_empty() || shared.len() >= mesh.number_of_faces() {
        return false;
    }

    // Link condition: the only vertices adjacent to both endpoints are the ones
    // opposite the edge. Anything else would pinch the surface.
    let opposite = shared.len();
    let na = mesh.vertices_around_vertex(a);
    let common = mesh
        .vertices_around_vertex(b)
        .into_iter()
        .filter(|v| na.binary_search(v).is_ok())
        .count();
    if common != opposite {
        debug!("collapse {}-{} rejected: link condition", a, b);
        return false;
    }

    // An interior edge between two boundary vertices would join two boundary loops.
    if opposite == 2 && is_boundary_vertex(mesh, a) && is_boundary_vertex(mesh, b) {
        return false;
    }

    // Faces that survive must not duplicate one another or flip over.
    let mut survivors: Vec<[VertexId; 3]> = Vec::new();
    for v in [a, b] {
        for &f in mesh.faces_around_vertex(v) {
            if shared.contains(&f) {
                continue;
            }
            let corners = mesh.face_vertices(f);
            let moved = corners.map(|c| if c == b { a } else { c });

            let mut key = moved;
            key.sort_unstable();
            if survivors.contains(&key) {
                debug!("collapse {}-{} rejected: duplicate face", a, b);
                return false;
            }
            survivors.push(key);

            let point = |c: VertexId| if c == a || c == b { position } else { mesh.point(c) };
            let after = Triangle {
                p0: point(corners[0]),
                p1: point(corners[1]),
                p2: point(corners[2]),
            };
            match (mesh.triangle(f).normal(), after.normal()) {
                (Some(n0), Some(n1)) if n0.dot(n1) > 0.0 => (),
                _ => {
                    debug!("collapse {}-{} rejected: face would flip", a, b);
                    return false;
                }
            }
        }
    }
    true
}
