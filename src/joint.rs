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

use cgmath::{InnerSpace, Matrix2, Matrix3, Point2, SquareMatrix, Vector2, Vector3, Zero};

use crate::math::{clamp, perp, rotate, truncate};
use crate::physics::{Body, BodyHandle};
use crate::pool::{Handle, Pool};

pub type JointHandle = Handle<Box<dyn Joint>>;

/// Anchor drift tolerated before a joint's position solve reports failure.
pub(crate) const LINEAR_SLOP: f64 = 0.0008;
/// Angular drift tolerated by limit constraints.
pub(crate) const ANGULAR_SLOP: f64 = 2.0 * f64::consts::PI / 180.0;
/// Cap on positional correction applied by a joint in one iteration.
pub(crate) const MAX_LINEAR_CORRECTION: f64 = 0.5;
/// Cap on angular correction applied by a limit in one iteration.
pub(crate) const MAX_ANGULAR_CORRECTION: f64 = 8.0 * f64::consts::PI / 180.0;

/// A velocity constraint between two bodies, solved alongside contacts in
/// the same sequential-impulse loop. Joints keep only handles to their
/// bodies; the world resolves them each call, and removes a joint eagerly
/// when either endpoint is removed.
pub trait Joint {
    fn body1(&self) -> BodyHandle;
    fn body2(&self) -> BodyHandle;

    /// Whether the two connected bodies may still collide with each other.
    fn collide_connected(&self) -> bool;

    /// Breakable joints are removed by the world once their reaction force
    /// exceeds `max_force`.
    fn breakable(&self) -> bool;
    fn max_force(&self) -> f64;

    /// Prepares the solve state for this step and applies last step's
    /// accumulated impulses when warm starting is on; when it is off, the
    /// accumulators are discarded instead.
    fn init(&mut self, bodies: &mut Pool<Body>, dt: f64, warm_starting: bool);

    /// One Gauss-Seidel pass over the joint's velocity constraints.
    fn solve_velocity(&mut self, bodies: &mut Pool<Body>);

    /// One pass of direct position correction. Returns true when the
    /// remaining error is within the slop tolerances.
    fn solve_position(&mut self, bodies: &mut Pool<Body>) -> bool;

    /// The constraint force exerted during the last step, recovered from
    /// the accumulated impulse.
    fn reaction_force(&self, dt_inv: f64) -> Vector2<f64>;

    fn reaction_torque(&self, _dt_inv: f64) -> f64 {
        0.0
    }
}

/// Solves `A * x = b`, yielding zero when the system is singular.
fn solve3(a: &Matrix3<f64>, b: Vector3<f64>) -> Vector3<f64> {
    a.invert().map(|inv| inv * b).unwrap_or_else(Vector3::zero)
}

fn solve2(a: &Matrix2<f64>, b: Vector2<f64>) -> Vector2<f64> {
    a.invert().map(|inv| inv * b).unwrap_or_else(Vector2::zero)
}

/// Keeps two anchor points a fixed distance apart.
///
/// With `d = p2 - p1` and `u = d / |d|` the constraint is
/// `C = |d| - rest_length`, `Cdot = dot(u, v2 + cross(w2, r2) - v1 -
/// cross(w1, r1))`, giving the Jacobian `J = [-u, -cross(r1, u), u,
/// cross(r2, u)]`.
///
/// A nonzero `frequency_hz` turns the rod into a damped spring: the
/// constraint is softened by the usual gamma/beta reformulation and
/// position correction is skipped entirely, letting the spring stretch.
pub struct DistanceJoint {
    pub body1: BodyHandle,
    pub body2: BodyHandle,
    pub collide_connected: bool,
    pub breakable: bool,
    pub max_force: f64,
    /// Anchor on body1 in body-local coordinates.
    pub anchor1: Point2<f64>,
    /// Anchor on body2 in body-local coordinates.
    pub anchor2: Point2<f64>,
    pub rest_length: f64,
    /// Spring frequency. Zero keeps the joint rigid.
    pub frequency_hz: f64,
    pub damping_ratio: f64,
    lambda_acc: f64,
    r1: Vector2<f64>,
    r2: Vector2<f64>,
    u: Vector2<f64>,
    s1: f64,
    s2: f64,
    em: f64,
    gamma: f64,
    beta_c: f64,
}

impl DistanceJoint {
    /// Connects two bodies through the given world-space anchor points.
    /// The current distance between the anchors becomes the rest length.
    pub fn new(
        bodies: &Pool<Body>,
        body1: BodyHandle,
        body2: BodyHandle,
        anchor1: Point2<f64>,
        anchor2: Point2<f64>,
    ) -> Self {
        let b1 = &bodies[body1];
        let b2 = &bodies[body2];

        DistanceJoint {
            body1,
            body2,
            collide_connected: true,
            breakable: false,
            max_force: f64::INFINITY,
            anchor1: b1.local_point(anchor1),
            anchor2: b2.local_point(anchor2),
            rest_length: (anchor2 - anchor1).magnitude(),
            frequency_hz: 0.0,
            damping_ratio: 0.0,
            lambda_acc: 0.0,
            r1: Vector2::zero(),
            r2: Vector2::zero(),
            u: Vector2::zero(),
            s1: 0.0,
            s2: 0.0,
            em: 0.0,
            gamma: 0.0,
            beta_c: 0.0,
        }
    }
}

impl Joint for DistanceJoint {
    fn body1(&self) -> BodyHandle {
        self.body1
    }

    fn body2(&self) -> BodyHandle {
        self.body2
    }

    fn collide_connected(&self) -> bool {
        self.collide_connected
    }

    fn breakable(&self) -> bool {
        self.breakable
    }

    fn max_force(&self) -> f64 {
        self.max_force
    }

    fn init(&mut self, bodies: &mut Pool<Body>, dt: f64, warm_starting: bool) {
        let (body1, body2) = bodies.pair_mut(self.body1, self.body2);

        self.r1 = body1.transform.rotate_vec(self.anchor1 - body1.centroid());
        self.r2 = body2.transform.rotate_vec(self.anchor2 - body2.centroid());

        let d = (body2.x + self.r2) - (body1.x + self.r1);
        let dist = d.magnitude();

        // Anchors closer than the slop give no usable axis.
        self.u = if dist > LINEAR_SLOP {
            d / dist
        } else {
            Vector2::zero()
        };

        self.s1 = self.r1.perp_dot(self.u);
        self.s2 = self.r2.perp_dot(self.u);

        let mut em_inv = body1.inv_mass
            + body2.inv_mass
            + body1.inv_moment * self.s1 * self.s1
            + body2.inv_moment * self.s2 * self.s2;
        self.em = if em_inv == 0.0 { 0.0 } else { 1.0 / em_inv };

        if self.frequency_hz > 0.0 {
            let omega = 2.0 * f64::consts::PI * self.frequency_hz;

            // Spring stiffness and damping coefficient, scaled by the
            // effective mass.
            let k = self.em * omega * omega;
            let c = self.em * 2.0 * self.damping_ratio * omega;

            // gamma and beta fold dt in up front.
            let gamma = (c + k * dt) * dt;
            self.gamma = if gamma == 0.0 { 0.0 } else { 1.0 / gamma };
            let beta = dt * k * self.gamma;

            self.beta_c = beta * (dist - self.rest_length);

            em_inv += self.gamma;
            self.em = if em_inv == 0.0 { 0.0 } else { 1.0 / em_inv };
        } else {
            self.gamma = 0.0;
            self.beta_c = 0.0;
        }

        if warm_starting {
            let impulse = self.u * self.lambda_acc;

            body1.v -= impulse * body1.inv_mass;
            body1.omega -= self.s1 * self.lambda_acc * body1.inv_moment;
            body2.v += impulse * body2.inv_mass;
            body2.omega += self.s2 * self.lambda_acc * body2.inv_moment;
        } else {
            self.lambda_acc = 0.0;
        }
    }

    fn solve_velocity(&mut self, bodies: &mut Pool<Body>) {
        let (body1, body2) = bodies.pair_mut(self.body1, self.body2);

        let cdot =
            self.u.dot(body2.v - body1.v) + self.s2 * body2.omega - self.s1 * body1.omega;
        let soft = self.beta_c + self.gamma * self.lambda_acc;
        let lambda = -self.em * (cdot + soft);

        self.lambda_acc += lambda;

        let impulse = self.u * lambda;

        body1.v -= impulse * body1.inv_mass;
        body1.omega -= self.s1 * lambda * body1.inv_moment;
        body2.v += impulse * body2.inv_mass;
        body2.omega += self.s2 * lambda * body2.inv_moment;
    }

    fn solve_position(&mut self, bodies: &mut Pool<Body>) -> bool {
        // Springs are allowed to stretch; nothing to correct.
        if self.frequency_hz > 0.0 {
            return true;
        }

        let (body1, body2) = bodies.pair_mut(self.body1, self.body2);

        let r1 = rotate(self.anchor1 - body1.centroid(), body1.angle);
        let r2 = rotate(self.anchor2 - body2.centroid(), body2.angle);

        let d = (body2.x + r2) - (body1.x + r1);
        let dist = d.magnitude();
        let u = if dist > 0.0 { d / dist } else { Vector2::zero() };

        let c = dist - self.rest_length;
        let correction = clamp(c, -MAX_LINEAR_CORRECTION, MAX_LINEAR_CORRECTION);

        let s1 = r1.perp_dot(u);
        let s2 = r2.perp_dot(u);
        let em_inv = body1.inv_mass
            + body2.inv_mass
            + body1.inv_moment * s1 * s1
            + body2.inv_moment * s2 * s2;
        let lambda_dt = if em_inv == 0.0 { 0.0 } else { -correction / em_inv };

        let impulse_dt = u * lambda_dt;

        body1.x -= impulse_dt * body1.inv_mass;
        body1.angle -= s1 * lambda_dt * body1.inv_moment;
        body2.x += impulse_dt * body2.inv_mass;
        body2.angle += s2 * lambda_dt * body2.inv_moment;

        c.abs() < LINEAR_SLOP
    }

    fn reaction_force(&self, dt_inv: f64) -> Vector2<f64> {
        self.u * (self.lambda_acc * dt_inv)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum LimitState {
    Inactive,
    AtLower,
    AtUpper,
    EqualLimits,
}

/// Pins two bodies together at an anchor they rotate freely around,
/// optionally bounded by an angular limit and driven by a motor.
///
/// The point-to-point rows are `C1 = p2 - p1` with `J1 = [-I, skew(r1), I,
/// -skew(r2)]`; the angular row used while a limit is active is `C2 = a2 -
/// a1 - ref_angle` with `J2 = [0, -1, 0, 1]`. Together they form a
/// symmetric 3x3 effective-mass system solved as a block.
pub struct RevoluteJoint {
    pub body1: BodyHandle,
    pub body2: BodyHandle,
    pub collide_connected: bool,
    pub breakable: bool,
    pub max_force: f64,
    /// Anchor on body1 in body-local coordinates.
    pub anchor1: Point2<f64>,
    /// Anchor on body2 in body-local coordinates.
    pub anchor2: Point2<f64>,
    /// Relative angle of the bodies when the joint was created. Limit
    /// angles are measured from here.
    pub ref_angle: f64,
    pub limit_enabled: bool,
    pub limit_lower_angle: f64,
    pub limit_upper_angle: f64,
    pub motor_enabled: bool,
    pub motor_speed: f64,
    pub max_motor_torque: f64,
    lambda_acc: Vector3<f64>,
    motor_lambda_acc: f64,
    max_motor_impulse: f64,
    limit_state: LimitState,
    r1: Vector2<f64>,
    r2: Vector2<f64>,
    em_inv: Matrix3<f64>,
    em2: f64,
}

impl RevoluteJoint {
    /// Connects two bodies through a single world-space anchor point.
    pub fn new(
        bodies: &Pool<Body>,
        body1: BodyHandle,
        body2: BodyHandle,
        anchor: Point2<f64>,
    ) -> Self {
        let b1 = &bodies[body1];
        let b2 = &bodies[body2];

        RevoluteJoint {
            body1,
            body2,
            collide_connected: false,
            breakable: false,
            max_force: f64::INFINITY,
            anchor1: b1.local_point(anchor),
            anchor2: b2.local_point(anchor),
            ref_angle: b2.angle - b1.angle,
            limit_enabled: false,
            limit_lower_angle: 0.0,
            limit_upper_angle: 0.0,
            motor_enabled: false,
            motor_speed: 0.0,
            max_motor_torque: 0.0,
            lambda_acc: Vector3::zero(),
            motor_lambda_acc: 0.0,
            max_motor_impulse: 0.0,
            limit_state: LimitState::Inactive,
            r1: Vector2::zero(),
            r2: Vector2::zero(),
            em_inv: Matrix3::zero(),
            em2: 0.0,
        }
    }

    /// Upper-left 2x2 block of the effective-mass system, for solves that
    /// leave the angular row out.
    fn block2(&self) -> Matrix2<f64> {
        Matrix2::new(
            self.em_inv.x.x,
            self.em_inv.x.y,
            self.em_inv.y.x,
            self.em_inv.y.y,
        )
    }
}

impl Joint for RevoluteJoint {
    fn body1(&self) -> BodyHandle {
        self.body1
    }

    fn body2(&self) -> BodyHandle {
        self.body2
    }

    fn collide_connected(&self) -> bool {
        self.collide_connected
    }

    fn breakable(&self) -> bool {
        self.breakable
    }

    fn max_force(&self) -> f64 {
        self.max_force
    }

    fn init(&mut self, bodies: &mut Pool<Body>, dt: f64, warm_starting: bool) {
        let (body1, body2) = bodies.pair_mut(self.body1, self.body2);

        if !self.motor_enabled {
            self.motor_lambda_acc = 0.0;
        } else {
            self.max_motor_impulse = self.max_motor_torque * dt;
        }

        if self.limit_enabled {
            let da = body2.angle - body1.angle - self.ref_angle;

            // The angular accumulator only survives while the same limit
            // stays engaged.
            if (self.limit_upper_angle - self.limit_lower_angle).abs() < ANGULAR_SLOP {
                self.limit_state = LimitState::EqualLimits;
            } else if da <= self.limit_lower_angle {
                if self.limit_state != LimitState::AtLower {
                    self.lambda_acc.z = 0.0;
                }
                self.limit_state = LimitState::AtLower;
            } else if da >= self.limit_upper_angle {
                if self.limit_state != LimitState::AtUpper {
                    self.lambda_acc.z = 0.0;
                }
                self.limit_state = LimitState::AtUpper;
            } else {
                self.limit_state = LimitState::Inactive;
                self.lambda_acc.z = 0.0;
            }
        } else {
            self.limit_state = LimitState::Inactive;
        }

        self.r1 = body1.transform.rotate_vec(self.anchor1 - body1.centroid());
        self.r2 = body2.transform.rotate_vec(self.anchor2 - body2.centroid());

        let sum_m_inv = body1.inv_mass + body2.inv_mass;
        let r1 = self.r1;
        let r2 = self.r2;
        let r1x_i = r1.x * body1.inv_moment;
        let r1y_i = r1.y * body1.inv_moment;
        let r2x_i = r2.x * body2.inv_moment;
        let r2y_i = r2.y * body2.inv_moment;
        let k11 = sum_m_inv + r1.y * r1y_i + r2.y * r2y_i;
        let k12 = -r1.x * r1y_i - r2.x * r2y_i;
        let k13 = -r1y_i - r2y_i;
        let k22 = sum_m_inv + r1.x * r1x_i + r2.x * r2x_i;
        let k23 = r1x_i + r2x_i;
        let k33 = body1.inv_moment + body2.inv_moment;

        // K is symmetric, so the column-major constructor reads the same.
        self.em_inv = Matrix3::new(k11, k12, k13, k12, k22, k23, k13, k23, k33);
        self.em2 = if k33 != 0.0 { 1.0 / k33 } else { 0.0 };

        if warm_starting {
            let lambda_xy = Vector2::new(self.lambda_acc.x, self.lambda_acc.y);
            let lambda_z = self.lambda_acc.z + self.motor_lambda_acc;

            body1.v -= lambda_xy * body1.inv_mass;
            body1.omega -= (self.r1.perp_dot(lambda_xy) + lambda_z) * body1.inv_moment;
            body2.v += lambda_xy * body2.inv_mass;
            body2.omega += (self.r2.perp_dot(lambda_xy) + lambda_z) * body2.inv_moment;
        } else {
            self.lambda_acc = Vector3::zero();
            self.motor_lambda_acc = 0.0;
        }
    }

    fn solve_velocity(&mut self, bodies: &mut Pool<Body>) {
        let (body1, body2) = bodies.pair_mut(self.body1, self.body2);

        // The motor torque is capped per step; a limit pinned to a single
        // angle overrides it.
        if self.motor_enabled && self.limit_state != LimitState::EqualLimits {
            let cdot = body2.omega - body1.omega - self.motor_speed;
            let lambda = -self.em2 * cdot;
            let old = self.motor_lambda_acc;
            self.motor_lambda_acc = clamp(
                old + lambda,
                -self.max_motor_impulse,
                self.max_motor_impulse,
            );
            let lambda = self.motor_lambda_acc - old;

            body1.omega -= lambda * body1.inv_moment;
            body2.omega += lambda * body2.inv_moment;
        }

        if self.limit_enabled && self.limit_state != LimitState::Inactive {
            let v1 = body1.v + perp(self.r1) * body1.omega;
            let v2 = body2.v + perp(self.r2) * body2.omega;
            let cdot1 = v2 - v1;
            let cdot2 = body2.omega - body1.omega;
            let mut lambda = solve3(&self.em_inv, -Vector3::new(cdot1.x, cdot1.y, cdot2));

            if self.limit_state == LimitState::EqualLimits {
                self.lambda_acc += lambda;
            } else {
                let new_lambda_z = self.lambda_acc.z + lambda.z;
                let lower_limited =
                    self.limit_state == LimitState::AtLower && new_lambda_z < 0.0;
                let upper_limited =
                    self.limit_state == LimitState::AtUpper && new_lambda_z > 0.0;

                if lower_limited || upper_limited {
                    // The limit may not pull. Redo the linear rows with the
                    // angular impulse forced back to zero.
                    let rhs = cdot1
                        + Vector2::new(self.em_inv.z.x, self.em_inv.z.y) * new_lambda_z;
                    let reduced = solve2(&self.block2(), -rhs);
                    lambda.x = reduced.x;
                    lambda.y = reduced.y;
                    lambda.z = -self.lambda_acc.z;

                    self.lambda_acc.x += lambda.x;
                    self.lambda_acc.y += lambda.y;
                    self.lambda_acc.z = 0.0;
                } else {
                    self.lambda_acc += lambda;
                }
            }

            let lambda_xy = Vector2::new(lambda.x, lambda.y);

            body1.v -= lambda_xy * body1.inv_mass;
            body1.omega -= (self.r1.perp_dot(lambda_xy) + lambda.z) * body1.inv_moment;
            body2.v += lambda_xy * body2.inv_mass;
            body2.omega += (self.r2.perp_dot(lambda_xy) + lambda.z) * body2.inv_moment;
        } else {
            let v1 = body1.v + perp(self.r1) * body1.omega;
            let v2 = body2.v + perp(self.r2) * body2.omega;
            let cdot = v2 - v1;
            let lambda = solve2(&self.block2(), -cdot);

            self.lambda_acc += Vector3::new(lambda.x, lambda.y, 0.0);

            body1.v -= lambda * body1.inv_mass;
            body1.omega -= self.r1.perp_dot(lambda) * body1.inv_moment;
            body2.v += lambda * body2.inv_mass;
            body2.omega += self.r2.perp_dot(lambda) * body2.inv_moment;
        }
    }

    fn solve_position(&mut self, bodies: &mut Pool<Body>) -> bool {
        let (body1, body2) = bodies.pair_mut(self.body1, self.body2);

        let mut angular_error = 0.0;

        if self.limit_enabled && self.limit_state != LimitState::Inactive {
            let da = body2.angle - body1.angle - self.ref_angle;

            let c = match self.limit_state {
                LimitState::EqualLimits => {
                    let c = clamp(
                        da - self.limit_lower_angle,
                        -MAX_ANGULAR_CORRECTION,
                        MAX_ANGULAR_CORRECTION,
                    );
                    angular_error = c.abs();
                    c
                }
                LimitState::AtLower => {
                    let c = da - self.limit_lower_angle;
                    angular_error = -c;
                    clamp(c + ANGULAR_SLOP, -MAX_ANGULAR_CORRECTION, 0.0)
                }
                LimitState::AtUpper => {
                    let c = da - self.limit_upper_angle;
                    angular_error = c;
                    clamp(c - ANGULAR_SLOP, 0.0, MAX_ANGULAR_CORRECTION)
                }
                LimitState::Inactive => unreachable!(),
            };

            let impulse_dt = -self.em2 * c;

            body1.angle -= impulse_dt * body1.inv_moment;
            body2.angle += impulse_dt * body2.inv_moment;
        }

        let r1 = rotate(self.anchor1 - body1.centroid(), body1.angle);
        let r2 = rotate(self.anchor2 - body2.centroid(), body2.angle);

        let c = (body2.x + r2) - (body1.x + r1);
        let correction = truncate(c, MAX_LINEAR_CORRECTION);
        let position_error = correction.magnitude();

        let sum_m_inv = body1.inv_mass + body2.inv_mass;
        let r1y_i = r1.y * body1.inv_moment;
        let r2y_i = r2.y * body2.inv_moment;
        let k11 = sum_m_inv + r1.y * r1y_i + r2.y * r2y_i;
        let k12 = -r1.x * r1y_i - r2.x * r2y_i;
        let k22 =
            sum_m_inv + r1.x * r1.x * body1.inv_moment + r2.x * r2.x * body2.inv_moment;
        let lambda_dt = solve2(&Matrix2::new(k11, k12, k12, k22), -correction);

        body1.x -= lambda_dt * body1.inv_mass;
        body1.angle -= r1.perp_dot(lambda_dt) * body1.inv_moment;
        body2.x += lambda_dt * body2.inv_mass;
        body2.angle += r2.perp_dot(lambda_dt) * body2.inv_moment;

        position_error < LINEAR_SLOP && angular_error < ANGULAR_SLOP
    }

    fn reaction_force(&self, dt_inv: f64) -> Vector2<f64> {
        Vector2::new(self.lambda_acc.x, self.lambda_acc.y) * dt_inv
    }
}

#[cfg(test)]
mod tests {
    mod joint {
        use crate::joint::*;
        use crate::physics::{Body, BodyHandle, BodyType};
        use crate::pool::Pool;
        use cgmath::{InnerSpace, Point2, Vector2, Zero};

        const DT: f64 = 1.0 / 60.0;

        fn unit_body(
            bodies: &mut Pool<Body>,
            id: u32,
            body_type: BodyType,
            x: f64,
            y: f64,
        ) -> BodyHandle {
            let mut body = Body::new(id, body_type, Point2::new(x, y), 0.0);
            if body_type == BodyType::Dynamic {
                body.set_mass(1.0);
                body.set_moment(1.0);
            }
            bodies.push(body)
        }

        #[test]
        fn defaults_differ_per_joint_kind() {
            let mut bodies = Pool::new();
            let h1 = unit_body(&mut bodies, 1, BodyType::Dynamic, 0.0, 0.0);
            let h2 = unit_body(&mut bodies, 2, BodyType::Dynamic, 3.0, 0.0);

            let rod = DistanceJoint::new(
                &bodies,
                h1,
                h2,
                Point2::new(0.0, 0.0),
                Point2::new(3.0, 0.0),
            );
            assert!(rod.collide_connected);
            assert!(!rod.breakable);
            assert_eq!(rod.max_force, std::f64::INFINITY);
            assert_eq!(rod.rest_length, 3.0);

            let pin = RevoluteJoint::new(&bodies, h1, h2, Point2::new(0.0, 0.0));
            assert!(!pin.collide_connected);
            assert_eq!(pin.ref_angle, 0.0);
            assert_eq!(pin.anchor2, Point2::new(-3.0, 0.0));
        }

        #[test]
        fn distance_joint_cancels_radial_velocity() {
            let mut bodies = Pool::new();
            let h1 = unit_body(&mut bodies, 1, BodyType::Dynamic, 0.0, 0.0);
            let h2 = unit_body(&mut bodies, 2, BodyType::Dynamic, 3.0, 0.0);
            bodies[h2].v = Vector2::new(1.0, 0.0);

            let mut rod = DistanceJoint::new(
                &bodies,
                h1,
                h2,
                Point2::new(0.0, 0.0),
                Point2::new(3.0, 0.0),
            );
            rod.init(&mut bodies, DT, true);
            rod.solve_velocity(&mut bodies);

            assert_eq!(bodies[h1].v, Vector2::new(0.5, 0.0));
            assert_eq!(bodies[h2].v, Vector2::new(0.5, 0.0));

            // Fully satisfied: a second pass changes nothing.
            rod.solve_velocity(&mut bodies);
            assert_eq!(bodies[h1].v, Vector2::new(0.5, 0.0));
            assert_eq!(bodies[h2].v, Vector2::new(0.5, 0.0));
        }

        #[test]
        fn distance_joint_corrects_stretch_in_position() {
            let mut bodies = Pool::new();
            let h1 = unit_body(&mut bodies, 1, BodyType::Dynamic, 0.0, 0.0);
            let h2 = unit_body(&mut bodies, 2, BodyType::Dynamic, 3.0, 0.0);

            let mut rod = DistanceJoint::new(
                &bodies,
                h1,
                h2,
                Point2::new(0.0, 0.0),
                Point2::new(3.0, 0.0),
            );

            bodies[h2].set_transform(Point2::new(3.5, 0.0), 0.0);
            assert!(rod.solve_position(&mut bodies));

            assert_relative_eq!(bodies[h1].x, Point2::new(0.25, 0.0));
            assert_relative_eq!(bodies[h2].x, Point2::new(3.25, 0.0));
            let dist = (bodies[h2].x - bodies[h1].x).magnitude();
            assert_relative_eq!(dist, 3.0);
        }

        #[test]
        fn soft_distance_joint_springs_instead_of_correcting() {
            let mut bodies = Pool::new();
            let h1 = unit_body(&mut bodies, 1, BodyType::Dynamic, 0.0, 0.0);
            let h2 = unit_body(&mut bodies, 2, BodyType::Dynamic, 3.5, 0.0);

            let mut spring = DistanceJoint::new(
                &bodies,
                h1,
                h2,
                Point2::new(0.0, 0.0),
                Point2::new(3.5, 0.0),
            );
            spring.rest_length = 3.0;
            spring.frequency_hz = 2.0;
            spring.damping_ratio = 0.7;

            spring.init(&mut bodies, DT, true);
            spring.solve_velocity(&mut bodies);

            // Stretched past rest: the spring pulls the bodies together.
            assert!(bodies[h1].v.x > 0.0);
            assert!(bodies[h2].v.x < 0.0);

            // No positional snap for springs.
            let before = (bodies[h1].x, bodies[h2].x);
            assert!(spring.solve_position(&mut bodies));
            assert_eq!(before, (bodies[h1].x, bodies[h2].x));
        }

        #[test]
        fn distance_joint_reports_reaction_along_its_axis() {
            let mut bodies = Pool::new();
            let h1 = unit_body(&mut bodies, 1, BodyType::Dynamic, 0.0, 0.0);
            let h2 = unit_body(&mut bodies, 2, BodyType::Dynamic, 3.0, 0.0);
            bodies[h2].v = Vector2::new(1.0, 0.0);

            let mut rod = DistanceJoint::new(
                &bodies,
                h1,
                h2,
                Point2::new(0.0, 0.0),
                Point2::new(3.0, 0.0),
            );
            rod.init(&mut bodies, DT, true);
            rod.solve_velocity(&mut bodies);

            assert_relative_eq!(rod.reaction_force(2.0), Vector2::new(-1.0, 0.0));
        }

        #[test]
        fn revolute_joint_pins_the_anchor_point() {
            let mut bodies = Pool::new();
            let h1 = unit_body(&mut bodies, 1, BodyType::Static, 0.0, 0.0);
            let h2 = unit_body(&mut bodies, 2, BodyType::Dynamic, 2.0, 0.0);
            bodies[h2].v = Vector2::new(0.0, 5.0);

            let mut pin = RevoluteJoint::new(&bodies, h1, h2, Point2::new(0.0, 0.0));
            pin.init(&mut bodies, DT, true);
            pin.solve_velocity(&mut bodies);

            // The constrained point no longer moves; the body swings
            // around it instead.
            let r2 = bodies[h2].transform.rotate_vec(
                pin.anchor2 - bodies[h2].centroid(),
            );
            let anchor_vel =
                bodies[h2].v + crate::math::perp(r2) * bodies[h2].omega;
            assert_relative_eq!(anchor_vel, Vector2::zero(), epsilon = 1.0e-12);
            assert!(bodies[h2].omega != 0.0);
        }

        #[test]
        fn revolute_limit_pushes_back_past_the_upper_bound() {
            let mut bodies = Pool::new();
            let h1 = unit_body(&mut bodies, 1, BodyType::Dynamic, 0.0, 0.0);
            let h2 = unit_body(&mut bodies, 2, BodyType::Dynamic, 0.0, 0.0);

            let mut pin = RevoluteJoint::new(&bodies, h1, h2, Point2::new(0.0, 0.0));
            pin.limit_enabled = true;
            pin.limit_lower_angle = -0.1;
            pin.limit_upper_angle = 0.1;

            bodies[h2].set_transform(Point2::new(0.0, 0.0), 0.3);
            pin.init(&mut bodies, DT, true);

            let before = bodies[h2].angle;
            let converged = pin.solve_position(&mut bodies);

            assert!(!converged);
            assert!(bodies[h2].angle < before);
            assert!(bodies[h1].angle > 0.0);
        }

        #[test]
        fn revolute_motor_saturates_at_its_torque_cap() {
            let mut bodies = Pool::new();
            let h1 = unit_body(&mut bodies, 1, BodyType::Static, 0.0, 0.0);
            let h2 = unit_body(&mut bodies, 2, BodyType::Dynamic, 0.0, 0.0);

            let mut pin = RevoluteJoint::new(&bodies, h1, h2, Point2::new(0.0, 0.0));
            pin.motor_enabled = true;
            pin.motor_speed = 2.0;
            pin.max_motor_torque = 10.0;

            pin.init(&mut bodies, DT, true);
            pin.solve_velocity(&mut bodies);

            let max_impulse = 10.0 * DT;
            assert_relative_eq!(bodies[h2].omega, max_impulse, epsilon = 1.0e-12);

            // Saturated: more iterations cannot push past the cap.
            pin.solve_velocity(&mut bodies);
            assert_relative_eq!(bodies[h2].omega, max_impulse, epsilon = 1.0e-12);
        }

        #[test]
        fn equal_limits_drive_toward_the_locked_angle() {
            let mut bodies = Pool::new();
            let h1 = unit_body(&mut bodies, 1, BodyType::Static, 0.0, 0.0);
            let h2 = unit_body(&mut bodies, 2, BodyType::Dynamic, 0.0, 0.0);

            let mut pin = RevoluteJoint::new(&bodies, h1, h2, Point2::new(0.0, 0.0));
            pin.limit_enabled = true;
            pin.limit_lower_angle = 0.5;
            pin.limit_upper_angle = 0.5;

            pin.init(&mut bodies, DT, true);
            let mut last = bodies[h2].angle;
            for _ in 0..60 {
                pin.init(&mut bodies, DT, true);
                if pin.solve_position(&mut bodies) {
                    break;
                }
                assert!(bodies[h2].angle > last);
                last = bodies[h2].angle;
            }
            assert_relative_eq!(bodies[h2].angle, 0.5, epsilon = ANGULAR_SLOP);
        }
    }
}
