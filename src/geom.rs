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

use cgmath::{EuclideanSpace, InnerSpace, Point2, Vector2};

use crate::bounds::Bounds;
use crate::math::{normalize_safe, perp, Transform};

/// A half-plane in Hesse normal form, `normal · x = d`. Points with
/// `normal · p - d > 0` lie outside.
#[derive(Copy, Clone, Debug)]
pub struct Plane {
    pub normal: Vector2<f64>,
    pub d: f64,
}

impl Plane {
    pub fn new(normal: Vector2<f64>, d: f64) -> Self {
        Plane { normal, d }
    }
}

/// Signed area of a polygon via the shoelace sum. Positive for
/// counter-clockwise winding.
pub fn polygon_area(verts: &[Point2<f64>]) -> f64 {
    let mut area = 0.0;
    for i in 0..verts.len() {
        let v1 = verts[i].to_vec();
        let v2 = verts[(i + 1) % verts.len()].to_vec();
        area += v1.perp_dot(v2);
    }
    area * 0.5
}

/// Area centroid of a counter-clockwise polygon. Degenerate polygons (zero
/// signed area) fall back to the origin.
pub fn polygon_centroid(verts: &[Point2<f64>]) -> Point2<f64> {
    let mut area = 0.0;
    let mut vsum = Vector2::new(0.0, 0.0);
    for i in 0..verts.len() {
        let v1 = verts[i].to_vec();
        let v2 = verts[(i + 1) % verts.len()].to_vec();
        let cross = v1.perp_dot(v2);
        area += cross;
        vsum += (v1 + v2) * cross;
    }
    if area == 0.0 {
        return Point2::origin();
    }
    Point2::from_vec(vsum / (3.0 * area))
}

/// Moment of inertia of a polygon of the given mass about the local origin,
/// with every vertex displaced by `offset` first.
pub fn polygon_inertia(mass: f64, verts: &[Point2<f64>], offset: Vector2<f64>) -> f64 {
    let mut sum1 = 0.0;
    let mut sum2 = 0.0;
    for i in 0..verts.len() {
        let v1 = verts[i].to_vec() + offset;
        let v2 = verts[(i + 1) % verts.len()].to_vec() + offset;
        let a = v2.perp_dot(v1);
        let b = v1.dot(v1) + v1.dot(v2) + v2.dot(v2);
        sum1 += a * b;
        sum2 += a;
    }
    if sum2 == 0.0 {
        return 0.0;
    }
    (mass * sum1) / (6.0 * sum2)
}

/// Builds a counter-clockwise convex hull from an arbitrary point cloud by
/// gift wrapping, starting from the right-most lowest point. Collinear points
/// keep the farther one.
pub fn convex_hull(points: &[Point2<f64>]) -> Vec<Point2<f64>> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut i0 = 0;
    let mut x0 = points[0].x;
    for (i, p) in points.iter().enumerate().skip(1) {
        if p.x > x0 || (p.x == x0 && p.y < points[i0].y) {
            i0 = i;
            x0 = p.x;
        }
    }

    let mut hull = Vec::new();
    let mut ih = i0;
    loop {
        hull.push(ih);

        let mut ie = 0;
        for i in 1..points.len() {
            if ie == ih {
                ie = i;
                continue;
            }
            let r = points[ie] - points[ih];
            let v = points[i] - points[ih];
            let c = r.perp_dot(v);
            if c < 0.0 {
                ie = i;
            }
            if c == 0.0 && v.magnitude2() > r.magnitude2() {
                ie = i;
            }
        }

        ih = ie;
        if ie == i0 {
            break;
        }
    }

    hull.into_iter().map(|i| points[i]).collect()
}

/// A circle at a local-space center.
#[derive(Clone, Debug)]
pub struct Circle {
    c: Point2<f64>,
    r: f64,
    tc: Point2<f64>,
    pub bounds: Bounds,
}

impl Circle {
    pub fn new(center: Point2<f64>, radius: f64) -> Self {
        Circle {
            c: center,
            r: radius,
            tc: center,
            bounds: Bounds::cleared(),
        }
    }

    pub fn radius(&self) -> f64 {
        self.r
    }

    pub fn center(&self) -> Point2<f64> {
        self.c
    }

    /// World-space center as of the last `cache_data`.
    pub fn world_center(&self) -> Point2<f64> {
        self.tc
    }

    pub fn area(&self) -> f64 {
        f64::consts::PI * self.r * self.r
    }

    pub fn centroid(&self) -> Point2<f64> {
        self.c
    }

    pub fn inertia(&self, mass: f64) -> f64 {
        mass * (self.r * self.r * 0.5 + self.c.to_vec().magnitude2())
    }

    pub fn cache_data(&mut self, xf: &Transform) {
        self.tc = xf.transform_point(self.c);
        self.bounds.mins = Point2::new(self.tc.x - self.r, self.tc.y - self.r);
        self.bounds.maxs = Point2::new(self.tc.x + self.r, self.tc.y + self.r);
    }

    pub fn point_query(&self, p: Point2<f64>) -> bool {
        (p - self.tc).magnitude2() < self.r * self.r
    }
}

/// A convex polygon described by counter-clockwise local vertices. Edge
/// planes are derived at construction; a winding with fewer than three
/// vertices, or one that turns the wrong way, marks the polygon non-convex
/// and it no longer participates in collision.
#[derive(Clone, Debug)]
pub struct ConvexPolygon {
    verts: Vec<Point2<f64>>,
    planes: Vec<Plane>,
    tverts: Vec<Point2<f64>>,
    tplanes: Vec<Plane>,
    convex: bool,
    pub bounds: Bounds,
}

impl ConvexPolygon {
    pub fn new(verts: Vec<Point2<f64>>) -> Self {
        let mut poly = ConvexPolygon {
            tverts: verts.clone(),
            verts,
            planes: Vec::new(),
            tplanes: Vec::new(),
            convex: false,
            bounds: Bounds::cleared(),
        };
        poly.finish();
        poly
    }

    /// An axis-aligned box centered on the local origin.
    pub fn box_shape(half_w: f64, half_h: f64) -> Self {
        ConvexPolygon::new(vec![
            Point2::new(-half_w, -half_h),
            Point2::new(half_w, -half_h),
            Point2::new(half_w, half_h),
            Point2::new(-half_w, half_h),
        ])
    }

    /// The convex hull of an arbitrary point cloud.
    pub fn hull(points: &[Point2<f64>]) -> Self {
        ConvexPolygon::new(convex_hull(points))
    }

    fn finish(&mut self) {
        let n = self.verts.len();
        self.planes.clear();
        self.tplanes.clear();
        self.convex = n >= 3;

        if n < 2 {
            return;
        }

        for i in 0..n {
            let a = self.verts[i];
            let b = self.verts[(i + 1) % n];
            let normal = normalize_safe(perp(a - b));
            self.planes.push(Plane::new(normal, normal.dot(a.to_vec())));
            self.tplanes.push(Plane::new(Vector2::new(0.0, 0.0), 0.0));
        }

        if !self.convex {
            return;
        }
        for i in 0..n {
            let v = self.verts[(i + 2) % n].to_vec();
            let plane = self.planes[i];
            if plane.normal.dot(v) - plane.d > 0.0 {
                self.convex = false;
            }
        }
    }

    pub fn is_convex(&self) -> bool {
        self.convex
    }

    pub fn verts(&self) -> &[Point2<f64>] {
        &self.verts
    }

    /// World-space vertices as of the last `cache_data`.
    pub fn world_verts(&self) -> &[Point2<f64>] {
        &self.tverts
    }

    /// World-space edge planes as of the last `cache_data`.
    pub fn world_planes(&self) -> &[Plane] {
        &self.tplanes
    }

    pub fn area(&self) -> f64 {
        polygon_area(&self.verts)
    }

    pub fn centroid(&self) -> Point2<f64> {
        polygon_centroid(&self.verts)
    }

    pub fn inertia(&self, mass: f64) -> f64 {
        polygon_inertia(mass, &self.verts, Vector2::new(0.0, 0.0))
    }

    pub fn cache_data(&mut self, xf: &Transform) {
        self.bounds.clear();
        let n = self.verts.len();
        if n == 0 {
            return;
        }

        for i in 0..n {
            self.tverts[i] = xf.transform_point(self.verts[i]);
        }

        if n < 2 {
            self.bounds.add_point(self.tverts[0]);
            return;
        }

        for i in 0..n {
            let a = self.tverts[i];
            let b = self.tverts[(i + 1) % n];
            let normal = normalize_safe(perp(a - b));
            self.tplanes[i] = Plane::new(normal, normal.dot(a.to_vec()));
            self.bounds.add_point(a);
        }
    }

    /// True when p is behind every world-space edge plane.
    pub fn contain_point(&self, p: Point2<f64>) -> bool {
        for plane in self.tplanes.iter() {
            if plane.normal.dot(p.to_vec()) - plane.d > 0.0 {
                return false;
            }
        }
        true
    }

    /// Like `contain_point`, but only tests planes facing the direction n.
    pub fn contain_point_partial(&self, p: Point2<f64>, n: Vector2<f64>) -> bool {
        for plane in self.tplanes.iter() {
            if plane.normal.dot(n) < 0.0 {
                continue;
            }
            if plane.normal.dot(p.to_vec()) - plane.d > 0.0 {
                return false;
            }
        }
        true
    }

    /// Smallest signed distance from any world vertex to the plane.
    /// Negative when the polygon reaches behind it.
    pub fn distance_on_plane(&self, normal: Vector2<f64>, d: f64) -> f64 {
        let mut min = f64::INFINITY;
        for v in self.tverts.iter() {
            min = min.min(normal.dot(v.to_vec()));
        }
        min - d
    }

    pub fn point_query(&self, p: Point2<f64>) -> bool {
        if !self.bounds.contain_point(p) {
            return false;
        }
        self.contain_point(p)
    }
}

/// Collision geometry attached to a body. A closed set: every dispatch over
/// shapes is an exhaustive match.
#[derive(Clone, Debug)]
pub enum Shape {
    Circle(Circle),
    Polygon(ConvexPolygon),
}

impl Shape {
    pub fn circle(center: Point2<f64>, radius: f64) -> Shape {
        Shape::Circle(Circle::new(center, radius))
    }

    pub fn polygon(verts: Vec<Point2<f64>>) -> Shape {
        Shape::Polygon(ConvexPolygon::new(verts))
    }

    pub fn box_shape(half_w: f64, half_h: f64) -> Shape {
        Shape::Polygon(ConvexPolygon::box_shape(half_w, half_h))
    }

    pub fn area(&self) -> f64 {
        match self {
            Shape::Circle(c) => c.area(),
            Shape::Polygon(p) => p.area(),
        }
    }

    pub fn centroid(&self) -> Point2<f64> {
        match self {
            Shape::Circle(c) => c.centroid(),
            Shape::Polygon(p) => p.centroid(),
        }
    }

    pub fn inertia(&self, mass: f64) -> f64 {
        match self {
            Shape::Circle(c) => c.inertia(mass),
            Shape::Polygon(p) => p.inertia(mass),
        }
    }

    /// Refreshes world-space vertices, planes and bounds from the owning
    /// body's transform. Must run before any narrow-phase query that step.
    pub fn cache_data(&mut self, xf: &Transform) {
        match self {
            Shape::Circle(c) => c.cache_data(xf),
            Shape::Polygon(p) => p.cache_data(xf),
        }
    }

    pub fn point_query(&self, p: Point2<f64>) -> bool {
        match self {
            Shape::Circle(c) => c.point_query(p),
            Shape::Polygon(p_) => p_.point_query(p),
        }
    }

    pub fn bounds(&self) -> &Bounds {
        match self {
            Shape::Circle(c) => &c.bounds,
            Shape::Polygon(p) => &p.bounds,
        }
    }

    /// Non-convex polygons are excluded from collision entirely.
    pub fn collidable(&self) -> bool {
        match self {
            Shape::Circle(_) => true,
            Shape::Polygon(p) => p.is_convex(),
        }
    }

    /// Sort key so that a circle always becomes shape1 of a pair.
    pub fn order(&self) -> u32 {
        match self {
            Shape::Circle(_) => 0,
            Shape::Polygon(_) => 1,
        }
    }
}
