// This file is part of rigid2d.
//
// rigid2d is free software: you can redistribute it and/or modify
// it under the terms of the GNU Lesser General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// rigid2d is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public License
// along with rigid2d. If not, see <http://www.gnu.org/licenses/>.

use cgmath::{EuclideanSpace, InnerSpace, Point2, Vector2, Zero};

/// Counter-clockwise perpendicular, `(-v.y, v.x)`.
#[inline]
pub fn perp(v: Vector2<f64>) -> Vector2<f64> {
    Vector2::new(-v.y, v.x)
}

/// Clockwise perpendicular, `(v.y, -v.x)`.
#[inline]
pub fn rperp(v: Vector2<f64>) -> Vector2<f64> {
    Vector2::new(v.y, -v.x)
}

/// Rotates a vector by an angle in radians.
#[inline]
pub fn rotate(v: Vector2<f64>, angle: f64) -> Vector2<f64> {
    let (s, c) = angle.sin_cos();
    Vector2::new(v.x * c - v.y * s, v.x * s + v.y * c)
}

/// Rotates a vector by the negation of an angle in radians.
#[inline]
pub fn unrotate(v: Vector2<f64>, angle: f64) -> Vector2<f64> {
    let (s, c) = angle.sin_cos();
    Vector2::new(v.x * c + v.y * s, -v.x * s + v.y * c)
}

/// Normalizes a vector, substituting the zero vector when the input has zero
/// length. Keeps degenerate geometry from spraying NaN through the solver.
#[inline]
pub fn normalize_safe(v: Vector2<f64>) -> Vector2<f64> {
    let len_sq = v.magnitude2();
    if len_sq > 0.0 {
        v / len_sq.sqrt()
    } else {
        Vector2::zero()
    }
}

/// Clamps a vector's magnitude to at most `length`, preserving direction.
#[inline]
pub fn truncate(v: Vector2<f64>, length: f64) -> Vector2<f64> {
    let len_sq = v.magnitude2();
    if len_sq > length * length {
        v * (length / len_sq.sqrt())
    } else {
        v
    }
}

#[inline(always)]
pub fn clamp(n: f64, min: f64, max: f64) -> f64 {
    if n < min {
        min
    } else if n > max {
        max
    } else {
        n
    }
}

/// A rigid pose: translation plus rotation, with the rotation's sine and
/// cosine cached. The cache is refreshed on every rotation write; the angle
/// itself is not wrapped.
#[derive(Copy, Clone, Debug)]
pub struct Transform {
    pub t: Vector2<f64>,
    rot: f64,
    s: f64,
    c: f64,
}

impl Transform {
    pub fn new(position: Vector2<f64>, angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Transform {
            t: position,
            rot: angle,
            s,
            c,
        }
    }

    pub fn identity() -> Self {
        Transform::new(Vector2::zero(), 0.0)
    }

    pub fn set(&mut self, position: Vector2<f64>, angle: f64) {
        self.t = position;
        self.set_rotation(angle);
    }

    pub fn set_position(&mut self, position: Vector2<f64>) {
        self.t = position;
    }

    pub fn set_rotation(&mut self, angle: f64) {
        self.rot = angle;
        let (s, c) = angle.sin_cos();
        self.s = s;
        self.c = c;
    }

    pub fn rotation(&self) -> f64 {
        self.rot
    }

    /// Rotates and then translates a local point into world space.
    #[inline]
    pub fn transform_point(&self, p: Point2<f64>) -> Point2<f64> {
        Point2::new(
            p.x * self.c - p.y * self.s + self.t.x,
            p.x * self.s + p.y * self.c + self.t.y,
        )
    }

    /// Maps a world point back into local space.
    #[inline]
    pub fn untransform_point(&self, p: Point2<f64>) -> Point2<f64> {
        let d = p.to_vec() - self.t;
        Point2::new(d.x * self.c + d.y * self.s, -d.x * self.s + d.y * self.c)
    }

    /// Applies only the rotational part.
    #[inline]
    pub fn rotate_vec(&self, v: Vector2<f64>) -> Vector2<f64> {
        Vector2::new(v.x * self.c - v.y * self.s, v.x * self.s + v.y * self.c)
    }

    /// Applies only the inverse of the rotational part.
    #[inline]
    pub fn unrotate_vec(&self, v: Vector2<f64>) -> Vector2<f64> {
        Vector2::new(v.x * self.c + v.y * self.s, -v.x * self.s + v.y * self.c)
    }
}

#[cfg(test)]
mod tests {
    mod math {
        use crate::math::*;
        use cgmath::{InnerSpace, Point2, Vector2, Zero};

        #[test]
        fn test_perp() {
            let v = Vector2::new(3.0, 4.0);
            assert_eq!(perp(v), Vector2::new(-4.0, 3.0));
            assert_eq!(rperp(v), Vector2::new(4.0, -3.0));
            assert_eq!(perp(v).dot(v), 0.0);
            assert_eq!(v.perp_dot(perp(v)), v.magnitude2());
        }

        #[test]
        fn test_rotate() {
            let v = Vector2::new(1.0, 0.0);
            let r = rotate(v, std::f64::consts::FRAC_PI_2);
            assert!((r.x - 0.0).abs() < 1.0e-12);
            assert!((r.y - 1.0).abs() < 1.0e-12);
            let back = unrotate(r, std::f64::consts::FRAC_PI_2);
            assert!((back.x - 1.0).abs() < 1.0e-12);
            assert!((back.y - 0.0).abs() < 1.0e-12);
        }

        #[test]
        fn test_normalize_safe() {
            assert_eq!(normalize_safe(Vector2::zero()), Vector2::zero());
            let n = normalize_safe(Vector2::new(0.0, 5.0));
            assert_eq!(n, Vector2::new(0.0, 1.0));
        }

        #[test]
        fn test_truncate() {
            let v = Vector2::new(3.0, 4.0);
            assert_eq!(truncate(v, 10.0), v);
            let t = truncate(v, 2.5);
            assert!((t.magnitude() - 2.5).abs() < 1.0e-12);
            assert!((t.x * v.y - t.y * v.x).abs() < 1.0e-12);
        }

        #[test]
        fn test_transform_round_trip() {
            let xf = Transform::new(Vector2::new(2.0, -1.0), 0.7);
            let p = Point2::new(3.5, 4.25);
            let q = xf.untransform_point(xf.transform_point(p));
            assert!((q.x - p.x).abs() < 1.0e-12);
            assert!((q.y - p.y).abs() < 1.0e-12);
        }

        #[test]
        fn test_transform_cache_consistency() {
            let mut xf = Transform::identity();
            xf.set_rotation(1.25);
            let v = Vector2::new(1.0, 2.0);
            let a = xf.rotate_vec(v);
            let b = rotate(v, 1.25);
            assert!((a.x - b.x).abs() < 1.0e-12);
            assert!((a.y - b.y).abs() < 1.0e-12);
        }
    }
}
