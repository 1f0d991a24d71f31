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

use cgmath::{InnerSpace, Vector2};

use smallvec::SmallVec;

use crate::collision::Contact;
use crate::math::{clamp, perp, rotate};
use crate::physics::{AttachedShape, Body, BodyHandle};
use crate::pool::Pool;

/// Penetration depth tolerated without any positional correction.
pub const COLLISION_SLOP: f64 = 0.0008;
/// Fraction of the remaining positional error corrected per iteration.
pub const BAUMGARTE: f64 = 0.28;
/// Cap on the positional correction applied in a single iteration, so one
/// deep contact cannot fling a body across the world.
pub const MAX_LINEAR_CORRECTION: f64 = 1.0;

/// Sequential-impulse solver for the contact manifold between one pair of
/// shapes. Solvers persist across steps for as long as their pair keeps
/// touching; `update` migrates accumulated impulses from the previous
/// manifold onto the new one so warm starting stays effective.
///
/// Restitution and friction are mixed once, when the pair first meets.
pub struct ContactSolver {
    pub body1: BodyHandle,
    pub body2: BodyHandle,
    pub shape1_id: u32,
    pub shape2_id: u32,
    /// Combined restitution of the pair.
    pub e: f64,
    /// Combined friction coefficient of the pair.
    pub u: f64,
    pub contacts: SmallVec<[Contact; 4]>,
}

impl ContactSolver {
    pub fn new(
        body1: BodyHandle,
        body2: BodyHandle,
        shape1: &AttachedShape,
        shape2: &AttachedShape,
        contacts: SmallVec<[Contact; 4]>,
    ) -> Self {
        // Mix restitution and friction values:
        ContactSolver {
            body1,
            body2,
            shape1_id: shape1.id,
            shape2_id: shape2.id,
            e: shape1.restitution.max(shape2.restitution),
            u: (shape1.friction * shape2.friction).sqrt(),
            contacts,
        }
    }

    /// Replaces the manifold with this step's contacts, carrying the
    /// accumulated impulses over to every point whose feature hash matches
    /// one from the previous step.
    pub fn update(&mut self, mut new_contacts: SmallVec<[Contact; 4]>) {
        for con in new_contacts.iter_mut() {
            if let Some(old) = self.contacts.iter().find(|old| old.hash == con.hash) {
                con.lambda_n_acc = old.lambda_n_acc;
                con.lambda_t_acc = old.lambda_t_acc;
            }
        }
        self.contacts = new_contacts;
    }

    /// Computes the per-contact solve state: moment arms, effective masses
    /// along the normal and tangent, and the restitution target velocity.
    /// A pair with no movable mass in a direction gets zero effective mass
    /// there and the solve leaves it untouched.
    pub fn init(&mut self, bodies: &Pool<Body>) {
        let body1 = &bodies[self.body1];
        let body2 = &bodies[self.body2];

        let sum_m_inv = body1.inv_mass + body2.inv_mass;

        for con in self.contacts.iter_mut() {
            con.r1 = con.p - body1.x;
            con.r2 = con.p - body2.x;

            con.r1_local = body1.transform.unrotate_vec(con.r1);
            con.r2_local = body2.transform.unrotate_vec(con.r2);

            let n = con.n;
            let t = perp(n);

            let sn1 = con.r1.perp_dot(n);
            let sn2 = con.r2.perp_dot(n);
            let emn_inv =
                sum_m_inv + body1.inv_moment * sn1 * sn1 + body2.inv_moment * sn2 * sn2;
            con.emn = if emn_inv == 0.0 { 0.0 } else { 1.0 / emn_inv };

            let st1 = con.r1.perp_dot(t);
            let st2 = con.r2.perp_dot(t);
            let emt_inv =
                sum_m_inv + body1.inv_moment * st1 * st1 + body2.inv_moment * st2 * st2;
            con.emt = if emt_inv == 0.0 { 0.0 } else { 1.0 / emt_inv };

            let rv = (body2.v + perp(con.r2) * body2.omega)
                - (body1.v + perp(con.r1) * body1.omega);
            con.bounce = rv.dot(n) * self.e;
        }
    }

    /// Applies the accumulated impulses from the previous step up front, so
    /// the iterative solve starts near last step's solution.
    pub fn warm_start(&self, bodies: &mut Pool<Body>) {
        let (body1, body2) = bodies.pair_mut(self.body1, self.body2);

        for con in self.contacts.iter() {
            let n = con.n;
            let impulse = Vector2::new(
                con.lambda_n_acc * n.x - con.lambda_t_acc * n.y,
                con.lambda_t_acc * n.x + con.lambda_n_acc * n.y,
            );

            body1.v -= impulse * body1.inv_mass;
            body1.omega -= con.r1.perp_dot(impulse) * body1.inv_moment;
            body2.v += impulse * body2.inv_mass;
            body2.omega += con.r2.perp_dot(impulse) * body2.inv_moment;
        }
    }

    /// One Gauss-Seidel pass over the manifold. The normal impulse is
    /// accumulated and clamped to pushing only; the tangential impulse is
    /// clamped to the friction cone spanned by the accumulated normal
    /// impulse. Both are applied immediately so later contacts in the same
    /// pass see the updated velocities.
    pub fn solve_velocity(&mut self, bodies: &mut Pool<Body>) {
        let (body1, body2) = bodies.pair_mut(self.body1, self.body2);

        for con in self.contacts.iter_mut() {
            let n = con.n;

            let rv = (body2.v + perp(con.r2) * body2.omega)
                - (body1.v + perp(con.r1) * body1.omega);

            let lambda_n = -con.emn * (rv.dot(n) + con.bounce);
            let lambda_n_old = con.lambda_n_acc;
            con.lambda_n_acc = (lambda_n_old + lambda_n).max(0.0);
            let lambda_n = con.lambda_n_acc - lambda_n_old;

            let lambda_t = -con.emt * rv.dot(perp(n));
            let lambda_t_max = con.lambda_n_acc * self.u;
            let lambda_t_old = con.lambda_t_acc;
            con.lambda_t_acc = clamp(lambda_t_old + lambda_t, -lambda_t_max, lambda_t_max);
            let lambda_t = con.lambda_t_acc - lambda_t_old;

            let impulse = Vector2::new(
                lambda_n * n.x - lambda_t * n.y,
                lambda_t * n.x + lambda_n * n.y,
            );

            body1.v -= impulse * body1.inv_mass;
            body1.omega -= con.r1.perp_dot(impulse) * body1.inv_moment;
            body2.v += impulse * body2.inv_mass;
            body2.omega += con.r2.perp_dot(impulse) * body2.inv_moment;
        }
    }

    /// One pass of direct position correction. Contact points are recovered
    /// from each body's current pose, so earlier corrections feed into
    /// later ones within the same pass. Returns true once the deepest
    /// penetration seen is within three slops, which the step loop uses as
    /// an early-out signal.
    pub fn solve_position(&self, bodies: &mut Pool<Body>) -> bool {
        let (body1, body2) = bodies.pair_mut(self.body1, self.body2);

        let sum_m_inv = body1.inv_mass + body2.inv_mass;
        let mut max_penetration = 0.0f64;

        for con in self.contacts.iter() {
            let n = con.n;

            let r1 = rotate(con.r1_local, body1.angle);
            let r2 = rotate(con.r2_local, body2.angle);

            let p1 = body1.x + r1;
            let p2 = body2.x + r2;

            let c = (p2 - p1).dot(n) + con.d;
            let correction = clamp(
                BAUMGARTE * (c + COLLISION_SLOP),
                -MAX_LINEAR_CORRECTION,
                0.0,
            );
            if correction == 0.0 {
                continue;
            }

            max_penetration = max_penetration.max(-c);

            let sn1 = r1.perp_dot(n);
            let sn2 = r2.perp_dot(n);
            let em_inv =
                sum_m_inv + body1.inv_moment * sn1 * sn1 + body2.inv_moment * sn2 * sn2;
            let lambda_dt = if em_inv == 0.0 { 0.0 } else { -correction / em_inv };

            let impulse_dt = n * lambda_dt;

            body1.x -= impulse_dt * body1.inv_mass;
            body1.angle -= sn1 * lambda_dt * body1.inv_moment;
            body2.x += impulse_dt * body2.inv_mass;
            body2.angle += sn2 * lambda_dt * body2.inv_moment;
        }

        max_penetration <= COLLISION_SLOP * 3.0
    }
}
