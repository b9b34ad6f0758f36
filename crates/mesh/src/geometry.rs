use cgmath::InnerSpace;

pub type Vector3 = cgmath::Vector3<f64>;

#[derive(Debug, PartialEq, Copy, Clone)]
pub struct Triangle {
    pub p0: Vector3,
    pub p1: Vector3,
    pub p2: Vector3,
}

impl Triangle {
    /// Cross product of the two edges leaving `p0`.
    ///
    /// The direction follows the winding of the triangle (right hand rule) and the
    /// magnitude is twice the triangle area, so callers that need both avoid a
    /// second square root.
    pub fn edge_cross(&self) -> Vector3 {
        (self.p1 - self.p0).cross(self.p2 - self.p0)
    }

    pub fn area(&self) -> f64 {
        self.edge_cross().magnitude() / 2.0
    }

    /// Unit normal, or `None` for a triangle with no area.
    pub fn normal(&self) -> Option<Vector3> {
        let n = self.edge_cross();
        let len = n.magnitude();
        if len > f64::EPSILON {
            Some(n / len)
        } else {
            None
        }
    }

    pub fn centroid(&self) -> Vector3 {
        (self.p0 + self.p1 + self.p2) / 3.0
    }
}

impl std::default::Default for Triangle {
    fn default() -> Self {
        let zero = Vector3 {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        };
        Self {
            p0: zero,
            p1: zero,
            p2: zero,
        }
    }
}
