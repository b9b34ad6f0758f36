//! Shape diameter function.
//!
//! The SDF of a face estimates the local thickness of the volume behind it: rays are
//! cast from the face centroid into the object, inside a cone around the inverted
//! normal, and the distances to the first surface they hit are averaged. Thin parts
//! of a model get small values and bulky parts large ones, which is what the
//! segmentation clusters on.

use std::f64::consts::PI;
use std::time::Instant;

use cgmath::InnerSpace;
use log::{debug, info};
use meshbridge_mesh::{FaceId, FaceProperty, SurfaceMesh, Vector3};

use crate::{face_neighbors, FaceBvh, GeometryError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct SdfParams {
    /// Full opening angle of the ray cone, in radians.
    pub cone_angle: f64,
    /// Rays cast per face.
    pub rays: usize,
    /// Fill faces without hits, smooth and normalize the values to `[0, 1]`.
    pub postprocess: bool,
}

impl Default for SdfParams {
    fn default() -> Self {
        Self {
            cone_angle: 2.0 / 3.0 * PI,
            rays: 25,
            postprocess: true,
        }
    }
}

impl SdfParams {
    fn validate(&self) -> Result<()> {
        if !(self.cone_angle > 0.0 && self.cone_angle <= PI) {
            return Err(GeometryError::invalid_argument(
                "cone angle",
                self.cone_angle,
                "must be in (0, pi]",
            ));
        }
        if self.rays == 0 {
            return Err(GeometryError::invalid_argument(
                "rays",
                self.rays,
                "must be positive",
            ));
        }
        Ok(())
    }
}

// Golden angle, used to spread the ray directions evenly over the cone.
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Computes the SDF value of every live face.
///
/// Faces whose rays hit nothing (open meshes, inconsistent winding) get no value of
/// their own. With post-processing they borrow one from their neighbors; without it
/// they are left at `0.0`.
pub fn sdf_values(mesh: &SurfaceMesh, params: &SdfParams) -> Result<FaceProperty<f64>> {
    params.validate()?;
    if mesh.number_of_faces() == 0 {
        return Err(GeometryError::NoFaces);
    }

    let start = Instant::now();
    let bvh = FaceBvh::new(mesh);
    let samples = cone_samples(params);

    let mut raw: FaceProperty<Option<f64>> = FaceProperty::new(mesh, None);
    for (f, t) in bvh.triangles() {
        let Some(normal) = t.normal() else {
            continue;
        };
        let origin = t.centroid();
        let (u, v) = basis(-normal);
        let distances: Vec<f64> = samples
            .iter()
            .filter_map(|&(x, y, z)| {
                let dir = u * x + v * y - normal * z;
                nearest_hit(&bvh, origin, dir, *f)
            })
            .collect();
        raw[*f] = robust_mean(distances);
    }

    let missing = mesh.faces().filter(|&f| raw[f].is_none()).count();
    debug!("sdf: {} of {} faces without hits", missing, bvh.len());

    let values = if params.postprocess {
        postprocess(mesh, raw)
    } else {
        let mut values = FaceProperty::new(mesh, 0.0);
        for f in mesh.faces() {
            values[f] = raw[f].unwrap_or(0.0);
        }
        values
    };
    info!(
        "sdf: {} faces, {} rays each, in {:?}",
        bvh.len(),
        params.rays,
        start.elapsed()
    );
    Ok(values)
}

// Unit directions inside the cone around +z, as (x, y, z) in the local frame.
fn cone_samples(params: &SdfParams) -> Vec<(f64, f64, f64)> {
    let half = params.cone_angle / 2.0;
    (0..params.rays)
        .map(|i| {
            let r = ((i as f64 + 0.5) / params.rays as f64).sqrt();
            let polar = r * half;
            let azimuth = i as f64 * GOLDEN_ANGLE;
            (
                polar.sin() * azimuth.cos(),
                polar.sin() * azimuth.sin(),
                polar.cos(),
            )
        })
        .collect()
}

// Two unit vectors completing `axis` to an orthonormal frame.
fn basis(axis: Vector3) -> (Vector3, Vector3) {
    let helper = if axis.x.abs() < 0.9 {
        Vector3::new(1.0, 0.0, 0.0)
    } else {
        Vector3::new(0.0, 1.0, 0.0)
    };
    let u = axis.cross(helper).normalize();
    let v = axis.cross(u);
    (u, v)
}

// Distance to the closest triangle hit from inside, if any.
fn nearest_hit(bvh: &FaceBvh, origin: Vector3, dir: Vector3, from: FaceId) -> Option<f64> {
    let hit = bvh.closest_hit(origin, dir, from)?;
    // A ray leaving the volume first meets a surface facing it; only rays that
    // reach the far side from the inside measure thickness.
    let facing_away = hit.triangle.normal().map_or(false, |n| n.dot(dir) > 0.0);
    facing_away.then_some(hit.distance)
}

// Mean of the distances within one standard deviation of the median.
fn robust_mean(mut distances: Vec<f64>) -> Option<f64> {
    if distances.is_empty() {
        return None;
    }
    distances.sort_by(f64::total_cmp);
    let median = distances[distances.len() / 2];
    let n = distances.len() as f64;
    let mean = distances.iter().sum::<f64>() / n;
    let deviation = (distances.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n).sqrt();
    let kept: Vec<f64> = distances
        .into_iter()
        .filter(|d| (d - median).abs() <= deviation)
        .collect();
    Some(kept.iter().sum::<f64>() / kept.len() as f64)
}

fn postprocess(mesh: &SurfaceMesh, mut raw: FaceProperty<Option<f64>>) -> FaceProperty<f64> {
    let neighbors = face_neighbors(mesh);
    let faces: Vec<FaceId> = mesh.faces().collect();

    // Fill holes from the neighborhood, one ring per pass.
    loop {
        let fills: Vec<(FaceId, f64)> = faces
            .iter()
            .filter(|&&f| raw[f].is_none())
            .filter_map(|&f| {
                let known: Vec<f64> = neighbors[f].iter().filter_map(|n| raw[n.face]).collect();
                (!known.is_empty()).then(|| (f, known.iter().sum::<f64>() / known.len() as f64))
            })
            .collect();
        if fills.is_empty() {
            break;
        }
        for (f, value) in fills {
            raw[f] = Some(value);
        }
    }
    // Components where no ray hit anything fall back to the global mean.
    let known: Vec<f64> = faces.iter().filter_map(|&f| raw[f]).collect();
    let fallback = if known.is_empty() {
        0.0
    } else {
        known.iter().sum::<f64>() / known.len() as f64
    };
    let mut values = FaceProperty::new(mesh, 0.0);
    for &f in &faces {
        values[f] = raw[f].unwrap_or(fallback);
    }

    let values = bilateral_smooth(mesh, &faces, &neighbors, values);
    normalize(&faces, values)
}

// One pass of bilateral smoothing over the face one-ring: neighbors count less the
// further away their centroid is and the more their value differs.
fn bilateral_smooth(
    mesh: &SurfaceMesh,
    faces: &[FaceId],
    neighbors: &FaceProperty<Vec<crate::FaceNeighbor>>,
    values: FaceProperty<f64>,
) -> FaceProperty<f64> {
    let n = faces.len() as f64;
    let mean = faces.iter().map(|&f| values[f]).sum::<f64>() / n;
    let range_sigma = (faces.iter().map(|&f| (values[f] - mean).powi(2)).sum::<f64>() / n).sqrt();

    let mut smoothed = values.clone();
    for &f in faces {
        let centroid = mesh.triangle(f).centroid();
        let ring = &neighbors[f];
        if ring.is_empty() {
            continue;
        }
        let spatial_sigma = ring
            .iter()
            .map(|g| (mesh.triangle(g.face).centroid() - centroid).magnitude())
            .sum::<f64>()
            / ring.len() as f64;

        let mut total = values[f];
        let mut weight = 1.0;
        for g in ring {
            let distance = (mesh.triangle(g.face).centroid() - centroid).magnitude();
            let difference = values[g.face] - values[f];
            let w = gaussian(distance, spatial_sigma) * gaussian(difference, range_sigma);
            total += w * values[g.face];
            weight += w;
        }
        smoothed[f] = total / weight;
    }
    smoothed
}

fn gaussian(x: f64, sigma: f64) -> f64 {
    if sigma <= f64::EPSILON {
        return 1.0;
    }
    (-(x * x) / (2.0 * sigma * sigma)).exp()
}

fn normalize(faces: &[FaceId], mut values: FaceProperty<f64>) -> FaceProperty<f64> {
    let (min, max) = faces.iter().fold((f64::MAX, f64::MIN), |(lo, hi), &f| {
        (lo.min(values[f]), hi.max(values[f]))
    });
    let range = max - min;
    for &f in faces {
        values[f] = if range > f64::EPSILON {
            (values[f] - min) / range
        } else {
            0.0
        };
    }
    values
}

#[cfg(test)]
mod tests {
    use float_eq::assert_float_eq;
    use meshbridge_mesh::{decode, MeshDescriptor};
    use meshbridge_test_data::{CUBE, OCTAHEDRON};

    use super::*;

    fn cube() -> SurfaceMesh {
        decode(&MeshDescriptor::new(CUBE.vertices.to_vec(), CUBE.faces.to_vec())).unwrap()
    }

    #[test]
    fn samples_stay_inside_cone() {
        let params = SdfParams::default();
        let samples = cone_samples(&params);
        assert_eq!(samples.len(), 25);
        let min_z = (params.cone_angle / 2.0).cos();
        for (x, y, z) in samples {
            assert_float_eq!(x * x + y * y + z * z, 1.0, abs <= 1e-12);
            assert!(z >= min_z - 1e-12);
        }
    }

    #[test]
    fn raw_cube_thickness() {
        let mesh = cube();
        let params = SdfParams {
            postprocess: false,
            ..SdfParams::default()
        };
        let values = sdf_values(&mesh, &params).unwrap();
        // No ray inside a unit cube travels further than the diagonal.
        for f in mesh.faces() {
            assert!(values[f] > 0.0, "{}", values[f]);
            assert!(values[f] <= 3f64.sqrt() + 1e-9, "{}", values[f]);
        }
    }

    #[test]
    fn postprocessed_values_are_normalized() {
        let decoded =
            decode(&MeshDescriptor::new(OCTAHEDRON.vertices.to_vec(), OCTAHEDRON.faces.to_vec()))
                .unwrap();
        for mesh in [cube(), decoded] {
            let values = sdf_values(&mesh, &SdfParams::default()).unwrap();
            for f in mesh.faces() {
                assert!((0.0..=1.0).contains(&values[f]));
            }
        }
    }

    #[test]
    fn open_mesh_falls_back_to_zero() {
        let mesh = decode(&MeshDescriptor::new(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            vec![0, 1, 2],
        ))
        .unwrap();
        let values = sdf_values(&mesh, &SdfParams::default()).unwrap();
        let f = mesh.faces().next().unwrap();
        assert_eq!(values[f], 0.0);
    }

    #[test]
    fn rejects_bad_params() {
        let mesh = cube();
        let params = SdfParams {
            rays: 0,
            ..SdfParams::default()
        };
        assert!(matches!(
            sdf_values(&mesh, &params),
            Err(GeometryError::InvalidArgument { name: "rays", .. })
        ));
        assert_eq!(
            sdf_values(&SurfaceMesh::new(), &SdfParams::default()),
            Err(GeometryError::NoFaces)
        );
    }
}
