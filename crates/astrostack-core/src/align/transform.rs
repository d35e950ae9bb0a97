use serde::{Deserialize, Serialize};

/// Determinants with a smaller magnitude are treated as singular.
const SINGULAR_DETERMINANT: f64 = 1e-12;

/// A 2D affine map from a target frame's pixel coordinates into the
/// reference frame's pixel coordinates:
///
/// ```text
/// x' = a·x + b·y + tx
/// y' = c·x + d·y + ty
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub const fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            tx: 0.0,
            ty: 0.0,
        }
    }

    pub const fn translation(dx: f64, dy: f64) -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            tx: dx,
            ty: dy,
        }
    }

    /// Uniform scale and rotation (radians, counter-clockwise in x/y
    /// coordinates) followed by a translation.
    pub fn similarity(scale: f64, rotation: f64, tx: f64, ty: f64) -> Self {
        Self::scaled(scale, scale, rotation, tx, ty)
    }

    /// Independent x/y scale, then rotation, then translation.
    pub fn scaled(sx: f64, sy: f64, rotation: f64, tx: f64, ty: f64) -> Self {
        let (sin, cos) = rotation.sin_cos();
        Self {
            a: cos * sx,
            b: -sin * sy,
            c: sin * sx,
            d: cos * sy,
            tx,
            ty,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.b * y + self.tx,
            self.c * x + self.d * y + self.ty,
        )
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// The inverse map, or `None` if the linear part is singular.
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < SINGULAR_DETERMINANT {
            return None;
        }
        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;
        Some(Self {
            a,
            b,
            c,
            d,
            tx: -(a * self.tx + b * self.ty),
            ty: -(c * self.tx + d * self.ty),
        })
    }

    /// Mean linear scale factor.
    pub fn scale(&self) -> f64 {
        self.determinant().abs().sqrt()
    }

    /// Rotation angle in radians.
    pub fn rotation(&self) -> f64 {
        self.c.atan2(self.a)
    }

    pub fn is_finite(&self) -> bool {
        [self.a, self.b, self.c, self.d, self.tx, self.ty]
            .iter()
            .all(|v| v.is_finite())
    }

    pub fn is_identity(&self, tolerance: f64) -> bool {
        let id = Self::identity();
        (self.a - id.a).abs() <= tolerance
            && self.b.abs() <= tolerance
            && self.c.abs() <= tolerance
            && (self.d - id.d).abs() <= tolerance
            && self.tx.abs() <= tolerance
            && self.ty.abs() <= tolerance
    }
}

impl std::fmt::Display for Transform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "shift ({:+.2}, {:+.2}) px, rotation {:+.3}°, scale {:.4}",
            self.tx,
            self.ty,
            self.rotation().to_degrees(),
            self.scale()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_round_trips_a_point() {
        let t = Transform::similarity(1.2, 0.3, 5.0, -2.0);
        let inv = t.inverse().unwrap();
        let (x, y) = t.apply(3.0, 4.0);
        let (bx, by) = inv.apply(x, y);
        assert!((bx - 3.0).abs() < 1e-9 && (by - 4.0).abs() < 1e-9);
    }

    #[test]
    fn singular_has_no_inverse() {
        let t = Transform::scaled(0.0, 1.0, 0.0, 0.0, 0.0);
        assert!(t.inverse().is_none());
    }
}
