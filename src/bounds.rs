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

use std::f64;

use cgmath::{Point2, Vector2};

/// A closed axis-aligned bounding box kept as lower and upper corners.
///
/// A cleared box is inverted (mins above maxs) so that the first added point
/// snaps both corners to it.
#[derive(Copy, Clone, Debug)]
pub struct Bounds {
    pub mins: Point2<f64>,
    pub maxs: Point2<f64>,
}

impl Bounds {
    pub fn new(mins: Point2<f64>, maxs: Point2<f64>) -> Self {
        Bounds { mins, maxs }
    }

    /// An inverted box that contains nothing.
    pub fn cleared() -> Self {
        Bounds {
            mins: Point2::new(f64::INFINITY, f64::INFINITY),
            maxs: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn clear(&mut self) {
        *self = Bounds::cleared();
    }

    /// Grows the box to cover p.
    pub fn add_point(&mut self, p: Point2<f64>) {
        if p.x < self.mins.x {
            self.mins.x = p.x;
        }
        if p.x > self.maxs.x {
            self.maxs.x = p.x;
        }
        if p.y < self.mins.y {
            self.mins.y = p.y;
        }
        if p.y > self.maxs.y {
            self.maxs.y = p.y;
        }
    }

    /// Grows the box to cover another box.
    pub fn add_bounds(&mut self, other: &Bounds) {
        self.add_point(other.mins);
        self.add_point(other.maxs);
    }

    /// The smallest box enclosing both arguments.
    pub fn combine(a: &Bounds, b: &Bounds) -> Bounds {
        let mut out = *a;
        out.add_bounds(b);
        out
    }

    /// Extends every side outward by s.
    pub fn expand(&mut self, s: f64) {
        self.mins.x -= s;
        self.mins.y -= s;
        self.maxs.x += s;
        self.maxs.y += s;
    }

    pub fn center(&self) -> Point2<f64> {
        Point2::new(
            (self.mins.x + self.maxs.x) * 0.5,
            (self.mins.y + self.maxs.y) * 0.5,
        )
    }

    pub fn extents(&self) -> Vector2<f64> {
        Vector2::new(
            (self.maxs.x - self.mins.x) * 0.5,
            (self.maxs.y - self.mins.y) * 0.5,
        )
    }

    pub fn contain_point(&self, p: Point2<f64>) -> bool {
        p.x >= self.mins.x && p.x <= self.maxs.x && p.y >= self.mins.y && p.y <= self.maxs.y
    }

    pub fn contains(&self, other: &Bounds) -> bool {
        self.contain_point(other.mins) && self.contain_point(other.maxs)
    }

    /// Closed-interval overlap test; touching boxes overlap.
    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.mins.x <= other.maxs.x
            && self.maxs.x >= other.mins.x
            && self.mins.y <= other.maxs.y
            && self.maxs.y >= other.mins.y
    }
}

#[cfg(test)]
mod tests {
    mod bounds {
        use crate::bounds::Bounds;
        use cgmath::Point2;

        #[test]
        fn test_add_point() {
            let mut b = Bounds::cleared();
            b.add_point(Point2::new(1.0, 2.0));
            assert_eq!(b.mins, Point2::new(1.0, 2.0));
            assert_eq!(b.maxs, Point2::new(1.0, 2.0));
            b.add_point(Point2::new(-1.0, 4.0));
            assert_eq!(b.mins, Point2::new(-1.0, 2.0));
            assert_eq!(b.maxs, Point2::new(1.0, 4.0));
        }

        #[test]
        fn test_overlaps() {
            let b1 = Bounds::new(Point2::new(0.0, 0.0), Point2::new(2.0, 2.0));
            let b2 = Bounds::new(Point2::new(1.0, 1.0), Point2::new(3.0, 3.0));
            let b3 = Bounds::new(Point2::new(2.5, 2.5), Point2::new(4.0, 4.0));
            // Touching edges count as overlap.
            let b4 = Bounds::new(Point2::new(2.0, 0.0), Point2::new(4.0, 2.0));
            assert!(b1.overlaps(&b2));
            assert!(b2.overlaps(&b1));
            assert!(!b1.overlaps(&b3));
            assert!(b1.overlaps(&b4));
        }

        #[test]
        fn test_combine_contains() {
            let b1 = Bounds::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0));
            let b2 = Bounds::new(Point2::new(2.0, 2.0), Point2::new(3.0, 3.0));
            let combined = Bounds::combine(&b1, &b2);
            assert!(combined.contains(&b1));
            assert!(combined.contains(&b2));
            assert!(!b1.contains(&b2));
            assert!(combined.contain_point(Point2::new(1.5, 1.5)));
        }

        #[test]
        fn test_expand() {
            let mut b = Bounds::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0));
            b.expand(0.5);
            assert_eq!(b.mins, Point2::new(-0.5, -0.5));
            assert_eq!(b.maxs, Point2::new(1.5, 1.5));
            assert_eq!(b.center(), Point2::new(0.5, 0.5));
            assert_eq!(b.extents().x, 1.0);
        }
    }
}
