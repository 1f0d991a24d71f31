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

use crate::bounds::Bounds;
use crate::geom::Shape;
use crate::joint::{Joint, JointHandle};
use crate::math::{clamp, perp, Transform};
use crate::pool::{Handle, Pool};

/// Handle to a body stored in a [`World`](crate::world::World).
pub type BodyHandle = Handle<Body>;

/// Motion class of a body.
///
/// `Static` and `Kinetic` bodies carry zero inverse mass and inverse moment
/// and never integrate force or torque. A `Kinetic` body differs from a
/// `Static` one only in that it counts as an active collision partner while
/// awake; to move one, set its transform directly. Only `Dynamic` bodies
/// respond to impulses and take part in the sleep state machine.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BodyType {
    Static,
    Kinetic,
    Dynamic,
}

/// A shape attached to a body, together with its material.
///
/// The shape id is assigned by the world when the shape is added and is
/// unique across all shapes in that world. Contact hashes and persistent
/// contact solvers are keyed on it.
#[derive(Clone, Debug)]
pub struct AttachedShape {
    pub id: u32,
    pub shape: Shape,
    /// Mass per unit area.
    pub density: f64,
    /// Friction coefficient. Pairs are mixed with `sqrt(u1 * u2)`.
    pub friction: f64,
    /// Restitution coefficient. Pairs are mixed with `max(e1, e2)`.
    pub restitution: f64,
}

/// A rigid body: a transform, a velocity state and a set of attached shapes.
///
/// `x` is the world-space center of mass, which coincides with the transform
/// applied to the local centroid. `reset_mass_data`, `set_transform` and the
/// end-of-step `sync_transform` all re-establish that relationship; the
/// solvers work exclusively on `x`/`angle` and the transform is caught up
/// afterwards.
#[derive(Clone, Debug)]
pub struct Body {
    id: u32,
    body_type: BodyType,
    /// Local-to-world transform. Regenerated from `x`/`angle` by
    /// `sync_transform` after each step.
    pub transform: Transform,
    /// Local center of mass, derived from the attached shapes.
    centroid: Point2<f64>,
    /// World-space center of mass.
    pub x: Point2<f64>,
    /// Orientation in radians. Not wrapped.
    pub angle: f64,
    /// Linear velocity of the center of mass.
    pub v: Vector2<f64>,
    /// Angular velocity in radians per second.
    pub omega: f64,
    /// Accumulated force, cleared after every velocity integration.
    pub force: Vector2<f64>,
    /// Accumulated torque, cleared after every velocity integration.
    pub torque: f64,
    /// Mass and second moment of area, derived by `reset_mass_data`.
    pub mass: f64,
    pub inv_mass: f64,
    pub moment: f64,
    pub inv_moment: f64,
    pub linear_damping: f64,
    pub angular_damping: f64,
    fixed_rotation: bool,
    /// Collision filter: which categories this body belongs to.
    pub category_bits: u32,
    /// Collision filter: which categories this body collides with.
    pub mask_bits: u32,
    /// Union of the world-space bounds of the attached shapes.
    pub bounds: Bounds,
    shapes: Vec<AttachedShape>,
    pub(crate) joints: Vec<JointHandle>,
    pub(crate) sleep_time: f64,
    awaked: bool,
}

impl Body {
    pub(crate) fn new(id: u32, body_type: BodyType, position: Point2<f64>, angle: f64) -> Self {
        Body {
            id,
            body_type,
            transform: Transform::new(position.to_vec(), angle),
            centroid: Point2::origin(),
            x: position,
            angle,
            v: Vector2::zero(),
            omega: 0.0,
            force: Vector2::zero(),
            torque: 0.0,
            mass: 0.0,
            inv_mass: 0.0,
            moment: 0.0,
            inv_moment: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            fixed_rotation: false,
            category_bits: 0x0001,
            mask_bits: 0xFFFF,
            bounds: Bounds::cleared(),
            shapes: Vec::new(),
            joints: Vec::new(),
            sleep_time: 0.0,
            awaked: true,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    pub fn is_static(&self) -> bool {
        self.body_type == BodyType::Static
    }

    pub fn is_kinetic(&self) -> bool {
        self.body_type == BodyType::Kinetic
    }

    pub fn is_dynamic(&self) -> bool {
        self.body_type == BodyType::Dynamic
    }

    /// The pose position, i.e. the translation of the body's transform.
    /// This is the point passed to `set_transform`, not the center of mass.
    pub fn position(&self) -> Point2<f64> {
        Point2::from_vec(self.transform.t)
    }

    /// Local center of mass.
    pub fn centroid(&self) -> Point2<f64> {
        self.centroid
    }

    pub fn fixed_rotation(&self) -> bool {
        self.fixed_rotation
    }

    /// Locks or unlocks rotation and re-derives the mass data.
    pub fn set_fixed_rotation(&mut self, flag: bool) {
        self.fixed_rotation = flag;
        self.reset_mass_data();
    }

    pub fn shapes(&self) -> &[AttachedShape] {
        &self.shapes
    }

    pub fn shapes_mut(&mut self) -> &mut [AttachedShape] {
        &mut self.shapes
    }

    pub fn joints(&self) -> &[JointHandle] {
        &self.joints
    }

    pub(crate) fn attach(&mut self, shape: AttachedShape) {
        self.shapes.push(shape);
        self.reset_mass_data();
    }

    /// Converts a world point into body-local coordinates.
    pub fn local_point(&self, p: Point2<f64>) -> Point2<f64> {
        self.transform.untransform_point(p)
    }

    /// Converts a body-local point into world coordinates.
    pub fn world_point(&self, p: Point2<f64>) -> Point2<f64> {
        self.transform.transform_point(p)
    }

    /// Teleports the body. The world center of mass is recomputed from the
    /// local centroid; velocities are left untouched.
    pub fn set_transform(&mut self, position: Point2<f64>, angle: f64) {
        self.transform.set(position.to_vec(), angle);
        self.x = self.transform.transform_point(self.centroid);
        self.angle = angle;
    }

    /// Regenerates the transform from the solved center of mass and angle.
    /// Runs at the end of each step, after the position solver has nudged
    /// `x` and `angle` directly.
    pub fn sync_transform(&mut self) {
        self.transform.set_rotation(self.angle);
        let t = self.x.to_vec() - self.transform.rotate_vec(self.centroid.to_vec());
        self.transform.set_position(t);
    }

    /// Refreshes the world-space caches of every attached shape and the
    /// body bounds from the current transform.
    pub fn cache_data(&mut self) {
        self.bounds.clear();
        let transform = self.transform;
        for attached in self.shapes.iter_mut() {
            attached.shape.cache_data(&transform);
            self.bounds.add_bounds(attached.shape.bounds());
        }
    }

    /// Integrates gravity, accumulated force and torque into the velocity,
    /// applies damping and clears the accumulators. Damping uses the
    /// first-order expansion `v *= clamp(1 - dt * c, 0, 1)` of exponential
    /// decay, so extreme coefficients stop the body instead of reversing it.
    pub fn update_velocity(&mut self, gravity: Vector2<f64>, dt: f64, damping: f64) {
        if !self.is_dynamic() || !self.is_awake() {
            return;
        }

        self.v += (gravity + self.force * self.inv_mass) * dt;
        self.omega += self.torque * self.inv_moment * dt;

        self.v *= clamp(1.0 - dt * (damping + self.linear_damping), 0.0, 1.0);
        self.omega *= clamp(1.0 - dt * (damping + self.angular_damping), 0.0, 1.0);

        self.force = Vector2::zero();
        self.torque = 0.0;
    }

    pub fn update_position(&mut self, dt: f64) {
        if !self.is_dynamic() || !self.is_awake() {
            return;
        }

        self.x += self.v * dt;
        self.angle += self.omega * dt;
    }

    /// Applies a force at a world point. Wakes the body; no-op unless the
    /// body is dynamic.
    pub fn apply_force(&mut self, force: Vector2<f64>, p: Point2<f64>) {
        if !self.is_dynamic() {
            return;
        }
        if !self.is_awake() {
            self.awake(true);
        }

        self.force += force;
        self.torque += (p - self.x).perp_dot(force);
    }

    pub fn apply_force_to_center(&mut self, force: Vector2<f64>) {
        if !self.is_dynamic() {
            return;
        }
        if !self.is_awake() {
            self.awake(true);
        }

        self.force += force;
    }

    pub fn apply_torque(&mut self, torque: f64) {
        if !self.is_dynamic() {
            return;
        }
        if !self.is_awake() {
            self.awake(true);
        }

        self.torque += torque;
    }

    /// Applies an impulse at a world point, changing the velocity
    /// immediately. Wakes the body; no-op unless the body is dynamic.
    pub fn apply_linear_impulse(&mut self, impulse: Vector2<f64>, p: Point2<f64>) {
        if !self.is_dynamic() {
            return;
        }
        if !self.is_awake() {
            self.awake(true);
        }

        self.v += impulse * self.inv_mass;
        self.omega += (p - self.x).perp_dot(impulse) * self.inv_moment;
    }

    pub fn apply_angular_impulse(&mut self, impulse: f64) {
        if !self.is_dynamic() {
            return;
        }
        if !self.is_awake() {
            self.awake(true);
        }

        self.omega += impulse * self.inv_moment;
    }

    pub fn set_mass(&mut self, mass: f64) {
        self.mass = mass;
        self.inv_mass = if mass > 0.0 { 1.0 / mass } else { 0.0 };
    }

    pub fn set_moment(&mut self, moment: f64) {
        self.moment = moment;
        self.inv_moment = if moment > 0.0 { 1.0 / moment } else { 0.0 };
    }

    /// Recomputes mass, moment and centroid from the attached shapes.
    ///
    /// The centroid is the mass-weighted average of the shape centroids and
    /// the moment is transferred to it by the parallel axis theorem,
    /// `i = sum(i_shape) - m * |centroid|^2`. Non-dynamic bodies keep zero
    /// mass data and only resync the world center. The world center moves
    /// when the centroid does, so the linear velocity picks up the matching
    /// `perp(dx) * omega` term to keep the motion of the old point intact.
    pub fn reset_mass_data(&mut self) {
        self.centroid = Point2::origin();
        self.mass = 0.0;
        self.inv_mass = 0.0;
        self.moment = 0.0;
        self.inv_moment = 0.0;

        if !self.is_dynamic() {
            self.x = self.transform.transform_point(self.centroid);
            return;
        }

        let mut total_mass_centroid = Vector2::zero();
        let mut total_mass = 0.0;
        let mut total_moment = 0.0;

        for attached in self.shapes.iter() {
            let mass = attached.shape.area() * attached.density;
            total_mass_centroid += attached.shape.centroid().to_vec() * mass;
            total_mass += mass;
            total_moment += attached.shape.inertia(mass);
        }

        if total_mass > 0.0 {
            self.centroid = Point2::from_vec(total_mass_centroid / total_mass);
            self.set_mass(total_mass);
            self.set_moment(total_moment - total_mass * self.centroid.to_vec().magnitude2());
        }
        if self.fixed_rotation {
            self.inv_moment = 0.0;
        }

        let old_x = self.x;
        self.x = self.transform.transform_point(self.centroid);
        self.v += perp(self.x - old_x) * self.omega;
    }

    /// Whether contacts should be generated between this body and `other`.
    /// Rejects self-pairs, pairs without a dynamic member, pairs whose
    /// filter masks do not agree in both directions, and pairs directly
    /// connected by a joint that suppresses collision.
    pub fn is_collidable(
        &self,
        other: &Body,
        other_handle: BodyHandle,
        joints: &Pool<Box<dyn Joint>>,
    ) -> bool {
        if self.id == other.id {
            return false;
        }
        if !self.is_dynamic() && !other.is_dynamic() {
            return false;
        }
        if self.mask_bits & other.category_bits == 0 || other.mask_bits & self.category_bits == 0 {
            return false;
        }

        for &handle in self.joints.iter() {
            if let Some(joint) = joints.get(handle) {
                if !joint.collide_connected()
                    && (joint.body1() == other_handle || joint.body2() == other_handle)
                {
                    return false;
                }
            }
        }

        true
    }

    /// Flips the sleep state. Waking resets the sleep timer; putting a
    /// dynamic body to sleep zeroes its velocities and accumulators.
    /// Non-dynamic bodies never sleep so `awake(false)` is ignored for them.
    pub fn awake(&mut self, flag: bool) {
        if flag {
            self.awaked = true;
            self.sleep_time = 0.0;
        } else if self.is_dynamic() {
            self.awaked = false;
            self.v = Vector2::zero();
            self.omega = 0.0;
            self.force = Vector2::zero();
            self.torque = 0.0;
        }
    }

    pub fn is_awake(&self) -> bool {
        self.awaked
    }

    /// Time in seconds this body has spent below the sleep velocity
    /// tolerances.
    pub fn sleep_time(&self) -> f64 {
        self.sleep_time
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * (self.mass * self.v.magnitude2() + self.moment * self.omega * self.omega)
    }
}
