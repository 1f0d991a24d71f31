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

use smallvec::SmallVec;

use crate::geom::{Circle, ConvexPolygon, Plane, Shape};
use crate::math::normalize_safe;

/// A single contact point between two shapes. The normal always points from
/// the first shape of the pair toward the second; `d` is the signed
/// separation along it, zero or negative while the shapes touch.
///
/// The solver fields past `hash` are scratch state. They are filled in by
/// the contact solver each step and carry no meaning outside of it.
#[derive(Copy, Clone, Debug)]
pub struct Contact {
    /// World-space contact point.
    pub p: Point2<f64>,
    /// Contact normal from shape1 to shape2.
    pub n: Vector2<f64>,
    /// Signed separation along the normal.
    pub d: f64,
    /// Encodes the feature pair (shape id and vertex index) that produced
    /// this point. Matching hashes across steps let accumulated impulses
    /// carry over; it has no other identity role.
    pub hash: u32,
    pub lambda_n_acc: f64,
    pub lambda_t_acc: f64,
    pub r1: Vector2<f64>,
    pub r2: Vector2<f64>,
    pub r1_local: Vector2<f64>,
    pub r2_local: Vector2<f64>,
    pub emn: f64,
    pub emt: f64,
    pub bounce: f64,
}

impl Contact {
    pub fn new(p: Point2<f64>, n: Vector2<f64>, d: f64, hash: u32) -> Self {
        Contact {
            p,
            n,
            d,
            hash,
            lambda_n_acc: 0.0,
            lambda_t_acc: 0.0,
            r1: Vector2::new(0.0, 0.0),
            r2: Vector2::new(0.0, 0.0),
            r1_local: Vector2::new(0.0, 0.0),
            r2_local: Vector2::new(0.0, 0.0),
            emn: 0.0,
            emt: 0.0,
            bounce: 0.0,
        }
    }
}

#[inline]
fn feature_hash(shape_id: u32, index: u32) -> u32 {
    (shape_id << 16) | index
}

/// Narrow phase for a pair of shapes whose bounds overlap. Produces up to
/// two contact points for polygon pairs and at most one otherwise, with
/// normals pointing from `shape1` toward `shape2`. Shapes flagged
/// non-collidable yield nothing.
pub fn collide(shape1: &Shape, id1: u32, shape2: &Shape, id2: u32) -> SmallVec<[Contact; 4]> {
    let mut contacts = SmallVec::new();

    if !shape1.collidable() || !shape2.collidable() {
        return contacts;
    }

    match (shape1, shape2) {
        (Shape::Circle(a), Shape::Circle(b)) => {
            circle2circle(a, b, &mut contacts);
        }
        (Shape::Circle(a), Shape::Polygon(b)) => {
            circle2poly(a, b, &mut contacts);
        }
        (Shape::Polygon(a), Shape::Polygon(b)) => {
            poly2poly(a, id1, b, id2, &mut contacts);
        }
        (Shape::Polygon(_), Shape::Circle(_)) => {
            // Callers are expected to order mixed pairs circle-first; flip
            // the result back around when one arrives the other way.
            contacts = collide(shape2, id2, shape1, id1);
            for contact in contacts.iter_mut() {
                contact.n = -contact.n;
            }
        }
    }

    contacts
}

/// Shared core of every circle-ish test, including circle against a polygon
/// corner (a zero-radius circle at the vertex). Produces a single contact
/// halfway through the overlap region.
fn circle_on_circle(
    c1: Point2<f64>,
    r1: f64,
    c2: Point2<f64>,
    r2: f64,
    contacts: &mut SmallVec<[Contact; 4]>,
) {
    let rmax = r1 + r2;
    let t = c2 - c1;
    let dist_sq = t.magnitude2();
    if dist_sq > rmax * rmax {
        return;
    }

    let dist = dist_sq.sqrt();
    let (n, p) = if dist > 0.0 {
        (t / dist, c1 + t * (0.5 + (r1 - r2) * 0.5 / dist))
    } else {
        // Coincident centers leave no axis to separate along. A fixed
        // normal keeps the result deterministic instead of NaN.
        (Vector2::new(0.0, 1.0), c1)
    };

    contacts.push(Contact::new(p, n, dist - rmax, 0));
}

fn circle2circle(circ1: &Circle, circ2: &Circle, contacts: &mut SmallVec<[Contact; 4]>) {
    circle_on_circle(
        circ1.world_center(),
        circ1.radius(),
        circ2.world_center(),
        circ2.radius(),
        contacts,
    );
}

fn circle2poly(circ: &Circle, poly: &ConvexPolygon, contacts: &mut SmallVec<[Contact; 4]>) {
    let verts = poly.world_verts();
    let planes = poly.world_planes();
    let tc = circ.world_center();
    let r = circ.radius();

    // Deepest face, with an early out on the first separating one.
    let mut min_dist = f64::NEG_INFINITY;
    let mut min_idx = 0;
    for (i, plane) in planes.iter().enumerate() {
        let dist = plane.normal.dot(tc.to_vec()) - plane.d - r;
        if dist > 0.0 {
            return;
        }
        if dist > min_dist {
            min_dist = dist;
            min_idx = i;
        }
    }

    let n = planes[min_idx].normal;
    let a = verts[min_idx];
    let b = verts[(min_idx + 1) % verts.len()];

    // Voronoi region along the deepest face. Beyond either endpoint the
    // circle really hits the corner, not the face.
    let dta = a.to_vec().perp_dot(n);
    let dtb = b.to_vec().perp_dot(n);
    let dt = tc.to_vec().perp_dot(n);

    if dt > dta {
        circle_on_circle(tc, r, a, 0.0, contacts);
    } else if dt < dtb {
        circle_on_circle(tc, r, b, 0.0, contacts);
    } else {
        contacts.push(Contact::new(
            tc - n * (r + min_dist * 0.5),
            -n,
            min_dist,
            0,
        ));
    }
}

struct SeparatingAxis {
    dist: f64,
    index: usize,
}

/// Least-penetration axis among `planes`, or None as soon as one of them
/// fully separates the polygon.
fn find_min_separating_axis(poly: &ConvexPolygon, planes: &[Plane]) -> Option<SeparatingAxis> {
    let mut best = SeparatingAxis {
        dist: f64::NEG_INFINITY,
        index: 0,
    };

    for (i, plane) in planes.iter().enumerate() {
        let dist = poly.distance_on_plane(plane.normal, plane.d);
        if dist > 0.0 {
            return None;
        }
        if dist > best.dist {
            best.dist = dist;
            best.index = i;
        }
    }

    Some(best)
}

fn poly2poly(
    poly1: &ConvexPolygon,
    id1: u32,
    poly2: &ConvexPolygon,
    id2: u32,
    contacts: &mut SmallVec<[Contact; 4]>,
) {
    let msa1 = match find_min_separating_axis(poly2, poly1.world_planes()) {
        Some(axis) => axis,
        None => return,
    };
    let msa2 = match find_min_separating_axis(poly1, poly2.world_planes()) {
        Some(axis) => axis,
        None => return,
    };

    // Ties stay on poly1's axis so a resting contact cannot flip its
    // reference face between steps.
    if msa1.dist >= msa2.dist {
        clip_face_contacts(poly1, id1, poly2, id2, &msa1, false, contacts);
    } else {
        clip_face_contacts(poly2, id2, poly1, id1, &msa2, true, contacts);
    }
}

#[derive(Copy, Clone)]
struct ClipVertex {
    p: Point2<f64>,
    hash: u32,
}

/// Clips a two-point segment to the half-space `normal . p <= d`. A point
/// born at the plane crossing takes `hash` as its feature. Returns how many
/// points survive; floating point error can leave fewer than two.
fn clip_segment(points: &mut [ClipVertex; 2], normal: Vector2<f64>, d: f64, hash: u32) -> usize {
    let mut out = *points;
    let mut num = 0;

    let dist1 = normal.dot(points[0].p.to_vec()) - d;
    let dist2 = normal.dot(points[1].p.to_vec()) - d;

    if dist1 <= 0.0 {
        out[num] = points[0];
        num += 1;
    }
    if dist2 <= 0.0 {
        out[num] = points[1];
        num += 1;
    }

    if dist1 * dist2 < 0.0 {
        let t = dist1 / (dist1 - dist2);
        out[num] = ClipVertex {
            p: points[0].p + (points[1].p - points[0].p) * t,
            hash,
        };
        num += 1;
    }

    *points = out;
    num
}

/// Builds the manifold for a polygon pair once the reference face is known:
/// picks the most anti-parallel incident face, clips it against the
/// reference face's side planes, and keeps the clipped points that lie at
/// or behind the reference face. `flip` is set when the reference polygon
/// is the second shape of the pair, so the stored normal still points from
/// shape1 to shape2.
fn clip_face_contacts(
    ref_poly: &ConvexPolygon,
    ref_id: u32,
    inc_poly: &ConvexPolygon,
    inc_id: u32,
    axis: &SeparatingAxis,
    flip: bool,
    contacts: &mut SmallVec<[Contact; 4]>,
) {
    let ref_plane = ref_poly.world_planes()[axis.index];
    let ref_normal = ref_plane.normal;

    let inc_planes = inc_poly.world_planes();
    let mut inc_index = 0;
    let mut min_dot = f64::INFINITY;
    for (i, plane) in inc_planes.iter().enumerate() {
        let dot = ref_normal.dot(plane.normal);
        if dot < min_dot {
            min_dot = dot;
            inc_index = i;
        }
    }

    let inc_verts = inc_poly.world_verts();
    let inc_i1 = inc_index;
    let inc_i2 = (inc_index + 1) % inc_verts.len();

    let ref_verts = ref_poly.world_verts();
    let ref_i1 = axis.index;
    let ref_i2 = (axis.index + 1) % ref_verts.len();
    let v1 = ref_verts[ref_i1];
    let v2 = ref_verts[ref_i2];

    let tangent = normalize_safe(v2 - v1);

    let mut points = [
        ClipVertex {
            p: inc_verts[inc_i1],
            hash: feature_hash(inc_id, inc_i1 as u32),
        },
        ClipVertex {
            p: inc_verts[inc_i2],
            hash: feature_hash(inc_id, inc_i2 as u32),
        },
    ];

    let neg_side = -tangent.dot(v1.to_vec());
    if clip_segment(&mut points, -tangent, neg_side, feature_hash(ref_id, ref_i1 as u32)) < 2 {
        return;
    }

    let pos_side = tangent.dot(v2.to_vec());
    if clip_segment(&mut points, tangent, pos_side, feature_hash(ref_id, ref_i2 as u32)) < 2 {
        return;
    }

    let normal = if flip { -ref_normal } else { ref_normal };

    for point in points.iter() {
        let separation = ref_normal.dot(point.p.to_vec()) - ref_plane.d;
        if separation <= 0.0 {
            contacts.push(Contact::new(point.p, normal, axis.dist, point.hash));
        }
    }
}
