//! Segmentation of a mesh from per-face SDF values.
//!
//! The values are log-normalized and clustered in one dimension with k-means. The
//! clusters define a Gaussian mixture whose posteriors give each face a cost for
//! every label, and labels are then smoothed over the face adjacency with iterated
//! conditional modes: neighbors across flat or convex edges are encouraged to agree,
//! neighbors across concave creases much less. Connected runs of equal labels form
//! the final segments.

use std::collections::VecDeque;
use std::f64::consts::PI;
use std::time::Instant;

use cgmath::InnerSpace;
use log::{debug, info};
use meshbridge_mesh::{FaceId, FaceProperty, SurfaceMesh};

use crate::{edge_faces, face_neighbors, FaceNeighbor, GeometryError, Result};

/// Largest number of clusters [`segmentation_from_sdf_values`] accepts.
///
/// Clustering keeps one cost per cluster for every face.
pub const MAX_CLUSTERS: usize = 100;

const LOG_NORMALIZE_ALPHA: f64 = 5.0;
const KMEANS_ITERATIONS: usize = 100;
const ICM_PASSES: usize = 20;
const VARIANCE_FLOOR: f64 = 1e-4;
const PROBABILITY_EPSILON: f64 = 1e-8;
const ANGLE_EPSILON: f64 = 1e-5;
// Convex edges count as much flatter than they are.
const CONVEX_FACTOR: f64 = 0.08;

#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation {
    /// Segment of every live face, in `0..number_of_segments`.
    pub segment_ids: FaceProperty<usize>,
    pub number_of_segments: usize,
}

#[derive(Debug, Clone, Copy)]
struct Cluster {
    mean: f64,
    variance: f64,
    weight: f64,
}

/// Splits the mesh into segments from the SDF values in `sdf`.
///
/// `clusters` is the number of SDF levels to separate, `smoothness` weighs label
/// agreement between neighboring faces against the fit to the levels; `0.0` turns
/// the smoothing off. The number of segments can exceed `clusters` since each
/// level may show up in several disconnected places.
pub fn segmentation_from_sdf_values(
    mesh: &SurfaceMesh,
    sdf: &FaceProperty<f64>,
    clusters: usize,
    smoothness: f64,
) -> Result<Segmentation> {
    if !(1..=MAX_CLUSTERS).contains(&clusters) {
        return Err(GeometryError::invalid_argument(
            "clusters",
            clusters,
            "must be in [1, 100]",
        ));
    }
    if !(smoothness.is_finite() && smoothness >= 0.0) {
        return Err(GeometryError::invalid_argument(
            "smoothness",
            smoothness,
            "must be a non-negative number",
        ));
    }
    if mesh.number_of_faces() == 0 {
        return Err(GeometryError::NoFaces);
    }
    if sdf.len() != mesh.face_capacity() {
        return Err(GeometryError::PropertySize {
            expected: mesh.face_capacity(),
            actual: sdf.len(),
        });
    }

    let start = Instant::now();
    let faces: Vec<FaceId> = mesh.faces().collect();
    let mut position = FaceProperty::new(mesh, 0);
    for (i, &f) in faces.iter().enumerate() {
        position[f] = i;
    }

    let values: Vec<f64> = faces.iter().map(|&f| log_normalize(sdf[f])).collect();
    let (model, initial) = kmeans(&values, clusters);
    debug!(
        "k-means centers: {:?}",
        model.iter().map(|c| c.mean).collect::<Vec<_>>()
    );
    let data: Vec<Vec<f64>> = values.iter().map(|&x| data_costs(&model, x)).collect();

    let neighbors = face_neighbors(mesh);
    let mean_edge = mean_edge_length(mesh);
    let pairs: Vec<Vec<(usize, f64)>> = faces
        .iter()
        .map(|&f| {
            neighbors[f]
                .iter()
                .map(|n| {
                    let w = smoothness * edge_weight(mesh, f, n, mean_edge);
                    (position[n.face], w)
                })
                .collect()
        })
        .collect();

    let labels = smooth_labels(initial, &data, &pairs);
    let (components, number_of_segments) = connected_components(&labels, &pairs);

    let mut segment_ids = FaceProperty::new(mesh, 0);
    for (i, &f) in faces.iter().enumerate() {
        segment_ids[f] = components[i];
    }
    info!(
        "segmentation: {} clusters, {} segments in {:?}",
        clusters,
        number_of_segments,
        start.elapsed()
    );
    Ok(Segmentation {
        segment_ids,
        number_of_segments,
    })
}

// Spreads small values apart so thin parts separate better.
fn log_normalize(value: f64) -> f64 {
    (value.max(0.0) * LOG_NORMALIZE_ALPHA + 1.0).ln() / (LOG_NORMALIZE_ALPHA + 1.0).ln()
}

fn nearest(centers: &[f64], x: f64) -> usize {
    let mut best = 0;
    for (i, c) in centers.iter().enumerate() {
        if (x - c).abs() < (x - centers[best]).abs() {
            best = i;
        }
    }
    best
}

fn kmeans(values: &[f64], k: usize) -> (Vec<Cluster>, Vec<usize>) {
    let n = values.len();
    let (min, max) = values
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), &x| (lo.min(x), hi.max(x)));

    // Evenly spaced over the value range, so the result is deterministic.
    let mut centers: Vec<f64> = (0..k)
        .map(|i| min + (i as f64 + 0.5) * (max - min) / k as f64)
        .collect();
    let assign = |centers: &[f64]| -> Vec<usize> {
        values.iter().map(|&x| nearest(centers, x)).collect()
    };

    let mut labels = assign(&centers);
    for _ in 0..KMEANS_ITERATIONS {
        for (c, center) in centers.iter_mut().enumerate() {
            let members: Vec<f64> = labels
                .iter()
                .zip(values)
                .filter(|&(&l, _)| l == c)
                .map(|(_, &x)| x)
                .collect();
            if !members.is_empty() {
                *center = members.iter().sum::<f64>() / members.len() as f64;
            }
        }
        let next = assign(&centers);
        if next == labels {
            break;
        }
        labels = next;
    }

    let model = centers
        .iter()
        .enumerate()
        .map(|(c, &mean)| {
            let members: Vec<f64> = labels
                .iter()
                .zip(values)
                .filter(|&(&l, _)| l == c)
                .map(|(_, &x)| x)
                .collect();
            let variance = if members.is_empty() {
                VARIANCE_FLOOR
            } else {
                let v = members.iter().map(|x| (x - mean).powi(2)).sum::<f64>()
                    / members.len() as f64;
                v.max(VARIANCE_FLOOR)
            };
            Cluster {
                mean,
                variance,
                weight: members.len() as f64 / n as f64,
            }
        })
        .collect();
    (model, labels)
}

// Negative log posterior of every cluster for value `x`.
fn data_costs(model: &[Cluster], x: f64) -> Vec<f64> {
    let log_joint: Vec<f64> = model
        .iter()
        .map(|c| {
            c.weight.ln()
                - 0.5 * (2.0 * PI * c.variance).ln()
                - (x - c.mean).powi(2) / (2.0 * c.variance)
        })
        .collect();
    let max = log_joint.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let total: f64 = log_joint.iter().map(|l| (l - max).exp()).sum();
    log_joint
        .iter()
        .map(|l| {
            let posterior = (l - max).exp() / total;
            -posterior.max(PROBABILITY_EPSILON).ln()
        })
        .collect()
}

fn mean_edge_length(mesh: &SurfaceMesh) -> f64 {
    let edges = edge_faces(mesh);
    let total: f64 = edges
        .keys()
        .map(|&(u, v)| (mesh.point(u) - mesh.point(v)).magnitude())
        .sum();
    total / edges.len().max(1) as f64
}

// Cost of giving `f` and its neighbor different labels, before `smoothness`.
fn edge_weight(mesh: &SurfaceMesh, f: FaceId, neighbor: &FaceNeighbor, mean_edge: f64) -> f64 {
    let (Some(nf), Some(ng)) = (mesh.triangle(f).normal(), mesh.triangle(neighbor.face).normal())
    else {
        return 0.0;
    };
    let (u, v) = neighbor.edge;
    let mut angle = nf.dot(ng).clamp(-1.0, 1.0).acos();
    let opposite = mesh
        .face_vertices(neighbor.face)
        .into_iter()
        .find(|&w| w != u && w != v);
    let convex = opposite.map_or(false, |w| nf.dot(mesh.point(w) - mesh.point(u)) < 0.0);
    if convex {
        angle *= CONVEX_FACTOR;
    }
    let length = if mean_edge > 0.0 {
        (mesh.point(u) - mesh.point(v)).magnitude() / mean_edge
    } else {
        1.0
    };
    -(angle / PI).max(ANGLE_EPSILON).ln() * length
}

fn smooth_labels(mut labels: Vec<usize>, data: &[Vec<f64>], pairs: &[Vec<(usize, f64)>]) -> Vec<usize> {
    for pass in 0..ICM_PASSES {
        let mut changed = 0;
        for i in 0..labels.len() {
            let cost = |l: usize| -> f64 {
                data[i][l]
                    + pairs[i]
                        .iter()
                        .filter(|&&(j, _)| labels[j] != l)
                        .map(|&(_, w)| w)
                        .sum::<f64>()
            };
            let best = (0..data[i].len())
                .min_by(|&a, &b| cost(a).total_cmp(&cost(b)))
                .unwrap_or(labels[i]);
            if best != labels[i] {
                labels[i] = best;
                changed += 1;
            }
        }
        debug!("icm pass {}: {} labels changed", pass, changed);
        if changed == 0 {
            break;
        }
    }
    labels
}

// Numbers the connected runs of equal labels in order of their lowest face.
fn connected_components(labels: &[usize], pairs: &[Vec<(usize, f64)>]) -> (Vec<usize>, usize) {
    let mut component = vec![usize::MAX; labels.len()];
    let mut count = 0;
    let mut queue = VecDeque::new();
    for seed in 0..labels.len() {
        if component[seed] != usize::MAX {
            continue;
        }
        component[seed] = count;
        queue.push_back(seed);
        while let Some(i) = queue.pop_front() {
            for &(j, _) in &pairs[i] {
                if component[j] == usize::MAX && labels[j] == labels[i] {
                    component[j] = count;
                    queue.push_back(j);
                }
            }
        }
        count += 1;
    }
    (component, count)
}
