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

use cgmath::{InnerSpace, Point2, Vector2};

use log::{debug, trace};

use serde::Serialize;

use crate::collision::{collide, Contact};
use crate::geom::Shape;
use crate::joint::{Joint, JointHandle};
use crate::physics::{AttachedShape, Body, BodyHandle, BodyType};
use crate::pool::Pool;
use crate::solver::ContactSolver;

/// Step length used by `update`.
pub const FIXED_DT: f64 = 1.0 / 60.0;

/// Most fixed steps a single `update` call may run; time owed beyond that
/// is dropped.
const MAX_SUB_STEPS: u32 = 4;

/// Linear speed below which a dynamic body accrues sleep time.
pub const SLEEP_LINEAR_TOLERANCE: f64 = 0.5;

/// Angular speed below which a dynamic body accrues sleep time.
pub const SLEEP_ANGULAR_TOLERANCE: f64 = 2.0 * f64::consts::PI / 180.0;

/// How long every dynamic body must stay below the sleep tolerances before
/// the world puts them to sleep.
pub const TIME_TO_SLEEP: f64 = 0.5;

/// Tunable parameters of a `World`.
#[derive(Copy, Clone, Debug)]
pub struct WorldConfig {
    /// Acceleration applied to every dynamic body. The default points along
    /// +y, which is "down" in a y-down screen space.
    pub gravity: Vector2<f64>,
    /// Global damping added to each body's own damping coefficients.
    pub damping: f64,
    /// Velocity solver iterations per step.
    pub velocity_iterations: usize,
    /// Position solver iterations per step.
    pub position_iterations: usize,
    /// Seed the solvers with the impulses accumulated on the previous step.
    pub warm_starting: bool,
    /// Put all dynamic bodies to sleep when the scene comes to rest.
    pub allow_sleep: bool,
}

impl Default for WorldConfig {
    fn default() -> WorldConfig {
        WorldConfig {
            gravity: Vector2::new(0.0, 10.0),
            damping: 0.0,
            velocity_iterations: 8,
            position_iterations: 4,
            warm_starting: true,
            allow_sleep: true,
        }
    }
}

/// Pose of a single body as captured by `snapshot`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct BodyPose {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub angle: f64,
}

/// A collection of bodies and joints advanced by an iterative impulse
/// solver.
///
/// Bodies and joints live in generation-counted pools and are addressed by
/// handle. The world persists one contact solver per colliding shape pair
/// for as long as the pair keeps touching, which is what lets accumulated
/// impulses warm start the next step. Everything iterates in pool slot
/// order, so two worlds built by the same sequence of calls stay bitwise
/// identical under `step`.
pub struct World {
    pub config: WorldConfig,
    bodies: Pool<Body>,
    joints: Pool<Box<dyn Joint>>,
    /// Persistent contact solvers, rebuilt in pair discovery order every
    /// step.
    solvers: Vec<ContactSolver>,
    next_body_id: u32,
    next_shape_id: u32,
    step_count: u64,
    contact_count: usize,
    /// Time owed to the fixed-step loop by `update`.
    accumulator: f64,
}

impl World {
    pub fn new(config: WorldConfig) -> World {
        World {
            config,
            bodies: Pool::new(),
            joints: Pool::new(),
            solvers: Vec::new(),
            next_body_id: 0,
            next_shape_id: 0,
            step_count: 0,
            contact_count: 0,
            accumulator: 0.0,
        }
    }

    /// Creates a body with no shapes and returns its handle. The body
    /// starts awake and, until a shape is attached, has no mass and
    /// collides with nothing.
    pub fn add_body(
        &mut self,
        body_type: BodyType,
        position: Point2<f64>,
        angle: f64,
    ) -> BodyHandle {
        let id = self.next_body_id;
        self.next_body_id += 1;
        let handle = self.bodies.push(Body::new(id, body_type, position, angle));
        debug!("added body {} ({:?}) as {:?}", id, body_type, handle);
        handle
    }

    /// Removes a body and returns it. Joints attached to the body are
    /// removed first (waking their other endpoint), and contact solvers
    /// that reference the body are dropped.
    ///
    /// Panics if the handle is stale.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Body {
        let attached: Vec<JointHandle> = self.bodies[handle].joints.clone();
        for joint_handle in attached {
            if self.joints.contains(joint_handle) {
                self.remove_joint(joint_handle);
            }
        }
        self.solvers
            .retain(|solver| solver.body1 != handle && solver.body2 != handle);

        let body = self.bodies.remove(handle);
        debug!("removed body {} ({:?})", body.id(), handle);
        body
    }

    /// Attaches a shape to a body and returns the world-assigned shape id.
    /// The body's mass properties are recomputed from all attached shapes
    /// and its world-space caches are refreshed.
    pub fn add_shape(
        &mut self,
        body: BodyHandle,
        shape: Shape,
        density: f64,
        friction: f64,
        restitution: f64,
    ) -> u32 {
        let id = self.next_shape_id;
        self.next_shape_id += 1;

        let body = &mut self.bodies[body];
        body.attach(AttachedShape {
            id,
            shape,
            density,
            friction,
            restitution,
        });
        body.cache_data();
        id
    }

    /// Adds a joint, waking both of its bodies and recording the joint on
    /// each so that body removal and collision filtering can find it.
    ///
    /// Panics if either body handle is stale.
    pub fn add_joint(&mut self, joint: Box<dyn Joint>) -> JointHandle {
        let body1 = joint.body1();
        let body2 = joint.body2();
        assert!(body1 != body2, "a joint must connect two distinct bodies");

        let handle = self.joints.push(joint);
        let (b1, b2) = self.bodies.pair_mut(body1, body2);
        b1.awake(true);
        b1.joints.push(handle);
        b2.awake(true);
        b2.joints.push(handle);
        debug!(
            "added joint {:?} between bodies {} and {}",
            handle,
            b1.id(),
            b2.id()
        );
        handle
    }

    /// Removes a joint and returns it, waking and unlinking both endpoint
    /// bodies that still exist.
    ///
    /// Panics if the handle is stale.
    pub fn remove_joint(&mut self, handle: JointHandle) -> Box<dyn Joint> {
        let joint = self.joints.remove(handle);
        for &body_handle in [joint.body1(), joint.body2()].iter() {
            if let Some(body) = self.bodies.get_mut(body_handle) {
                body.awake(true);
                body.joints.retain(|&h| h != handle);
            }
        }
        debug!("removed joint {:?}", handle);
        joint
    }

    pub fn body(&self, handle: BodyHandle) -> &Body {
        &self.bodies[handle]
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> &mut Body {
        &mut self.bodies[handle]
    }

    pub fn contains_body(&self, handle: BodyHandle) -> bool {
        self.bodies.contains(handle)
    }

    pub fn joint(&self, handle: JointHandle) -> &dyn Joint {
        &*self.joints[handle]
    }

    pub fn joint_mut(&mut self, handle: JointHandle) -> &mut dyn Joint {
        &mut *self.joints[handle]
    }

    pub fn contains_joint(&self, handle: JointHandle) -> bool {
        self.joints.contains(handle)
    }

    /// The body pool. Joint constructors take this to resolve anchors.
    pub fn bodies(&self) -> &Pool<Body> {
        &self.bodies
    }

    pub fn joints(&self) -> &Pool<Box<dyn Joint>> {
        &self.joints
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Number of contact points generated by the most recent step.
    pub fn contact_count(&self) -> usize {
        self.contact_count
    }

    /// Contact points of the persistent solvers, in solver order.
    pub fn contacts(&self) -> impl Iterator<Item = &Contact> + '_ {
        self.solvers.iter().flat_map(|solver| solver.contacts.iter())
    }

    /// Fixed steps run so far.
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// The first shape containing the point, scanning bodies and their
    /// shapes in slot order. Returns the owning body and the shape id.
    pub fn find_shape_by_point(&self, p: Point2<f64>) -> Option<(BodyHandle, u32)> {
        for handle in self.bodies.handles() {
            for attached in self.bodies[handle].shapes() {
                if attached.shape.point_query(p) {
                    return Some((handle, attached.id));
                }
            }
        }
        None
    }

    pub fn find_body_by_point(&self, p: Point2<f64>) -> Option<BodyHandle> {
        self.find_shape_by_point(p).map(|(handle, _)| handle)
    }

    /// Total kinetic energy of the dynamic bodies.
    pub fn kinetic_energy(&self) -> f64 {
        self.bodies
            .iter()
            .filter(|body| body.is_dynamic())
            .map(|body| body.kinetic_energy())
            .sum()
    }

    /// Captures the pose of every body, in slot order. Two worlds built by
    /// the same sequence of calls and stepped identically produce equal
    /// snapshots.
    pub fn snapshot(&self) -> Vec<BodyPose> {
        self.bodies
            .iter()
            .map(|body| {
                let p = body.position();
                BodyPose {
                    id: body.id(),
                    x: p.x,
                    y: p.y,
                    angle: body.angle,
                }
            })
            .collect()
    }

    /// Advances the world by `elapsed` seconds of wall time, running fixed
    /// `FIXED_DT` steps and carrying the remainder to the next call. At
    /// most `MAX_SUB_STEPS` steps run per call; if more time than that is
    /// owed, the surplus is dropped.
    pub fn update(&mut self, elapsed: f64) {
        self.accumulator += elapsed;
        let mut steps = MAX_SUB_STEPS;
        while steps > 0 && self.accumulator >= FIXED_DT {
            self.step(FIXED_DT);
            self.accumulator -= FIXED_DT;
            steps -= 1;
        }
        if self.accumulator > FIXED_DT {
            self.accumulator = 0.0;
        }
    }

    /// Advances the simulation by `dt` seconds.
    ///
    /// A step runs, in order: velocity integration, contact generation,
    /// joint wake propagation, solver setup and warm starting, the velocity
    /// iterations, position integration, breakable-joint checks, the
    /// position iterations, transform synchronization and finally sleep
    /// bookkeeping. Restitution therefore sees velocities with this step's
    /// gravity already applied.
    pub fn step(&mut self, dt: f64) {
        let dt_inv = if dt > 0.0 { 1.0 / dt } else { 0.0 };
        self.step_count += 1;

        // Integrate velocities, consuming the forces accumulated since the
        // last step.
        let gravity = self.config.gravity;
        let damping = self.config.damping;
        for body in self.bodies.iter_mut() {
            body.update_velocity(gravity, dt, damping);
        }

        self.generate_contacts();

        // A joint with exactly one active body wakes its sleeping partner.
        let mut joint_handles: Vec<JointHandle> = self.joints.handles().collect();
        for &handle in joint_handles.iter() {
            let (body1, body2) = {
                let joint = &self.joints[handle];
                (joint.body1(), joint.body2())
            };
            let (b1, b2) = self.bodies.pair_mut(body1, body2);
            let active1 = b1.is_awake() && !b1.is_static();
            let active2 = b2.is_awake() && !b2.is_static();
            if active1 != active2 {
                if !active1 {
                    b1.awake(true);
                }
                if !active2 {
                    b2.awake(true);
                }
            }
        }

        for solver in self.solvers.iter_mut() {
            solver.init(&self.bodies);
        }
        let warm_starting = self.config.warm_starting;
        for &handle in joint_handles.iter() {
            self.joints[handle].init(&mut self.bodies, dt, warm_starting);
        }
        if warm_starting {
            for solver in self.solvers.iter() {
                solver.warm_start(&mut self.bodies);
            }
        } else {
            for solver in self.solvers.iter_mut() {
                for con in solver.contacts.iter_mut() {
                    con.lambda_n_acc = 0.0;
                    con.lambda_t_acc = 0.0;
                }
            }
        }

        // Velocity solve, joints before contacts on every iteration.
        for _ in 0..self.config.velocity_iterations {
            for &handle in joint_handles.iter() {
                self.joints[handle].solve_velocity(&mut self.bodies);
            }
            for solver in self.solvers.iter_mut() {
                solver.solve_velocity(&mut self.bodies);
            }
        }

        for body in self.bodies.iter_mut() {
            body.update_position(dt);
        }

        // Joints whose reaction exceeds their limit break here, between the
        // velocity and position solves.
        let mut any_broke = false;
        for &handle in joint_handles.iter() {
            let broke = {
                let joint = &self.joints[handle];
                joint.breakable()
                    && joint.reaction_force(dt_inv).magnitude2()
                        >= joint.max_force() * joint.max_force()
            };
            if broke {
                debug!("joint {:?} broke", handle);
                self.remove_joint(handle);
                any_broke = true;
            }
        }
        if any_broke {
            joint_handles = self.joints.handles().collect();
        }

        // Position solve, contacts before joints, stopping early once every
        // constraint reports convergence.
        let mut position_solved = false;
        for _ in 0..self.config.position_iterations {
            let mut contacts_ok = true;
            for solver in self.solvers.iter() {
                contacts_ok &= solver.solve_position(&mut self.bodies);
            }
            let mut joints_ok = true;
            for &handle in joint_handles.iter() {
                joints_ok &= self.joints[handle].solve_position(&mut self.bodies);
            }
            if contacts_ok && joints_ok {
                position_solved = true;
                break;
            }
        }

        // Catch the transforms up with the solved positions and refresh the
        // world-space caches of everything that moved.
        for body in self.bodies.iter_mut() {
            body.sync_transform();
            if body.is_dynamic() && body.is_awake() {
                body.cache_data();
            }
        }

        if self.config.allow_sleep {
            self.update_sleep(dt, position_solved);
        }

        trace!(
            "step {}: {} bodies, {} pairs, {} contacts, position solved: {}",
            self.step_count,
            self.bodies.len(),
            self.solvers.len(),
            self.contact_count,
            position_solved
        );
    }

    /// Refreshes the shape caches, runs the O(n²) pair scan and rebuilds
    /// the persistent solver list. Pairs are visited in slot order, so the
    /// solver list order, and with it the impulse application order, is
    /// stable from step to step.
    fn generate_contacts(&mut self) {
        for body in self.bodies.iter_mut() {
            body.cache_data();
        }
        self.contact_count = 0;

        let handles: Vec<BodyHandle> = self.bodies.handles().collect();
        let mut fresh: Vec<ContactSolver> = Vec::with_capacity(self.solvers.len());

        for (i, &h1) in handles.iter().enumerate() {
            for &h2 in handles[i + 1..].iter() {
                {
                    let b1 = &self.bodies[h1];
                    let b2 = &self.bodies[h2];
                    let active1 = b1.is_awake() && !b1.is_static();
                    let active2 = b2.is_awake() && !b2.is_static();
                    if !active1 && !active2 {
                        continue;
                    }
                    if !b1.is_collidable(b2, h2, &self.joints) {
                        continue;
                    }
                    if !b1.bounds.overlaps(&b2.bounds) {
                        continue;
                    }
                }
                self.collide_pair(h1, h2, &mut fresh);
            }
        }

        // Solvers whose pairs stopped colliding are dropped here, along
        // with their accumulated impulses.
        self.solvers = fresh;
    }

    /// Narrow phase for one body pair: collides every shape of `ha` against
    /// every shape of `hb` and reuses or creates the pair's solver.
    fn collide_pair(&mut self, ha: BodyHandle, hb: BodyHandle, fresh: &mut Vec<ContactSolver>) {
        let count_a = self.bodies[ha].shapes().len();
        let count_b = self.bodies[hb].shapes().len();

        for i in 0..count_a {
            for j in 0..count_b {
                // Order the pair so that a circle is always shape 1.
                let (h1, s1, h2, s2) = {
                    let sa = &self.bodies[ha].shapes()[i];
                    let sb = &self.bodies[hb].shapes()[j];
                    if sa.shape.order() <= sb.shape.order() {
                        (ha, i, hb, j)
                    } else {
                        (hb, j, ha, i)
                    }
                };
                let (id1, id2, contacts) = {
                    let shape1 = &self.bodies[h1].shapes()[s1];
                    let shape2 = &self.bodies[h2].shapes()[s2];
                    let contacts = collide(&shape1.shape, shape1.id, &shape2.shape, shape2.id);
                    (shape1.id, shape2.id, contacts)
                };
                if contacts.is_empty() {
                    continue;
                }
                self.contact_count += contacts.len();

                if let Some(pos) = self
                    .solvers
                    .iter()
                    .position(|solver| solver.shape1_id == id1 && solver.shape2_id == id2)
                {
                    let mut solver = self.solvers.swap_remove(pos);
                    solver.update(contacts);
                    fresh.push(solver);
                } else {
                    // A brand-new contact pair wakes both bodies.
                    let (b1, b2) = self.bodies.pair_mut(h1, h2);
                    b1.awake(true);
                    b2.awake(true);
                    let solver = {
                        let shape1 = &self.bodies[h1].shapes()[s1];
                        let shape2 = &self.bodies[h2].shapes()[s2];
                        ContactSolver::new(h1, h2, shape1, shape2, contacts)
                    };
                    fresh.push(solver);
                }
            }
        }
    }

    /// Global sleep policy: every dynamic body must stay below the sleep
    /// tolerances for `TIME_TO_SLEEP` and the position solve must have
    /// converged; then all dynamic bodies sleep together.
    fn update_sleep(&mut self, dt: f64, position_solved: bool) {
        let linear_tolerance_sq = SLEEP_LINEAR_TOLERANCE * SLEEP_LINEAR_TOLERANCE;
        let angular_tolerance_sq = SLEEP_ANGULAR_TOLERANCE * SLEEP_ANGULAR_TOLERANCE;

        let mut min_sleep_time = f64::INFINITY;
        let mut any_awake = false;
        for body in self.bodies.iter_mut() {
            if !body.is_dynamic() {
                continue;
            }
            if body.is_awake() {
                any_awake = true;
            }
            if body.omega * body.omega > angular_tolerance_sq
                || body.v.magnitude2() > linear_tolerance_sq
            {
                body.sleep_time = 0.0;
                min_sleep_time = 0.0;
            } else {
                body.sleep_time += dt;
                min_sleep_time = min_sleep_time.min(body.sleep_time);
            }
        }

        if any_awake && position_solved && min_sleep_time >= TIME_TO_SLEEP {
            trace!("all dynamic bodies asleep after step {}", self.step_count);
            for body in self.bodies.iter_mut() {
                body.awake(false);
            }
        }
    }
}

impl Default for World {
    fn default() -> World {
        World::new(WorldConfig::default())
    }
}

#[cfg(test)]
mod tests {
    mod world {
        use crate::geom::Shape;
        use crate::physics::BodyType;
        use crate::world::*;
        use cgmath::{Point2, Vector2};
        use std::f64;

        /// Density that gives a unit-radius circle a mass of one.
        const UNIT_DENSITY: f64 = 1.0 / f64::consts::PI;

        fn quiet_world() -> World {
            World::new(WorldConfig {
                gravity: Vector2::new(0.0, 0.0),
                ..WorldConfig::default()
            })
        }

        #[test]
        fn default_config() {
            let config = WorldConfig::default();
            assert_eq!(config.gravity, Vector2::new(0.0, 10.0));
            assert_eq!(config.damping, 0.0);
            assert_eq!(config.velocity_iterations, 8);
            assert_eq!(config.position_iterations, 4);
            assert!(config.warm_starting);
            assert!(config.allow_sleep);
        }

        #[test]
        fn ids_assigned_in_creation_order() {
            let mut world = quiet_world();
            let a = world.add_body(BodyType::Dynamic, Point2::new(0.0, 0.0), 0.0);
            let b = world.add_body(BodyType::Static, Point2::new(5.0, 0.0), 0.0);

            assert_eq!(world.body(a).id(), 0);
            assert_eq!(world.body(b).id(), 1);

            assert_eq!(world.add_shape(a, Shape::circle(Point2::new(0.0, 0.0), 1.0), 1.0, 0.5, 0.0), 0);
            assert_eq!(world.add_shape(b, Shape::box_shape(1.0, 1.0), 1.0, 0.5, 0.0), 1);
            assert_eq!(world.add_shape(a, Shape::box_shape(0.5, 0.5), 1.0, 0.5, 0.0), 2);
        }

        #[test]
        fn add_shape_computes_mass_and_bounds() {
            let mut world = quiet_world();
            let a = world.add_body(BodyType::Dynamic, Point2::new(3.0, -2.0), 0.0);
            world.add_shape(a, Shape::circle(Point2::new(0.0, 0.0), 1.0), UNIT_DENSITY, 0.5, 0.0);

            let body = world.body(a);
            assert_relative_eq!(body.mass, 1.0);
            assert!(body.bounds.contain_point(Point2::new(3.0, -2.0)));
            assert!(!body.bounds.contain_point(Point2::new(3.0, -0.5)));
        }

        #[test]
        fn find_queries_scan_shapes_in_slot_order() {
            let mut world = quiet_world();
            let a = world.add_body(BodyType::Dynamic, Point2::new(0.0, 0.0), 0.0);
            let circle_id =
                world.add_shape(a, Shape::circle(Point2::new(0.0, 0.0), 1.0), 1.0, 0.5, 0.0);
            let b = world.add_body(BodyType::Static, Point2::new(5.0, 0.0), 0.0);
            let box_id = world.add_shape(b, Shape::box_shape(1.0, 1.0), 1.0, 0.5, 0.0);

            assert_eq!(
                world.find_shape_by_point(Point2::new(0.2, 0.2)),
                Some((a, circle_id))
            );
            assert_eq!(
                world.find_shape_by_point(Point2::new(5.5, 0.5)),
                Some((b, box_id))
            );
            assert_eq!(world.find_body_by_point(Point2::new(5.5, 0.5)), Some(b));
            assert_eq!(world.find_body_by_point(Point2::new(100.0, 100.0)), None);
        }

        #[test]
        fn kinetic_energy_sums_dynamic_bodies_only() {
            let mut world = quiet_world();
            let a = world.add_body(BodyType::Dynamic, Point2::new(0.0, 0.0), 0.0);
            world.add_shape(a, Shape::circle(Point2::new(0.0, 0.0), 1.0), UNIT_DENSITY, 0.5, 0.0);
            world.body_mut(a).v = Vector2::new(3.0, 0.0);

            let b = world.add_body(BodyType::Kinetic, Point2::new(10.0, 0.0), 0.0);
            world.add_shape(b, Shape::box_shape(1.0, 1.0), 1.0, 0.5, 0.0);
            world.body_mut(b).v = Vector2::new(100.0, 0.0);

            assert_relative_eq!(world.kinetic_energy(), 4.5);
        }

        #[test]
        fn snapshot_lists_bodies_in_slot_order() {
            let mut world = quiet_world();
            world.add_body(BodyType::Static, Point2::new(1.0, 2.0), 0.25);
            world.add_body(BodyType::Dynamic, Point2::new(-4.0, 0.5), 0.0);

            let poses = world.snapshot();
            assert_eq!(poses.len(), 2);
            assert_eq!(poses[0], BodyPose { id: 0, x: 1.0, y: 2.0, angle: 0.25 });
            assert_eq!(poses[1], BodyPose { id: 1, x: -4.0, y: 0.5, angle: 0.0 });
        }

        #[test]
        fn free_fall_integrates_velocity_before_position() {
            let mut world = World::default();
            let a = world.add_body(BodyType::Dynamic, Point2::new(0.0, 0.0), 0.0);
            world.add_shape(a, Shape::circle(Point2::new(0.0, 0.0), 1.0), UNIT_DENSITY, 0.5, 0.0);

            let dt = 1.0 / 60.0;
            world.step(dt);

            let body = world.body(a);
            assert_relative_eq!(body.v.y, 10.0 * dt);
            // Semi-implicit Euler: the fresh velocity moves the body.
            assert_relative_eq!(body.position().y, 10.0 * dt * dt);
        }

        #[test]
        fn teleported_body_collides_on_the_next_step() {
            let mut world = quiet_world();
            let ground = world.add_body(BodyType::Static, Point2::new(0.0, 0.0), 0.0);
            world.add_shape(ground, Shape::box_shape(5.0, 1.0), 1.0, 0.5, 0.0);
            let ball = world.add_body(BodyType::Dynamic, Point2::new(100.0, 100.0), 0.0);
            world.add_shape(ball, Shape::circle(Point2::new(0.0, 0.0), 1.0), UNIT_DENSITY, 0.5, 0.0);

            world.step(FIXED_DT);
            assert_eq!(world.contact_count(), 0);

            world
                .body_mut(ball)
                .set_transform(Point2::new(0.0, -1.5), 0.0);
            world.step(FIXED_DT);
            assert!(world.contact_count() > 0);
        }

        #[test]
        fn remove_body_detaches_joints_and_solvers() {
            use crate::joint::DistanceJoint;

            let mut world = quiet_world();
            let a = world.add_body(BodyType::Dynamic, Point2::new(0.0, 0.0), 0.0);
            world.add_shape(a, Shape::circle(Point2::new(0.0, 0.0), 1.0), UNIT_DENSITY, 0.5, 0.0);
            let b = world.add_body(BodyType::Dynamic, Point2::new(1.5, 0.0), 0.0);
            world.add_shape(b, Shape::circle(Point2::new(0.0, 0.0), 1.0), UNIT_DENSITY, 0.5, 0.0);

            let rod = DistanceJoint::new(
                world.bodies(),
                a,
                b,
                Point2::new(0.0, 0.0),
                Point2::new(1.5, 0.0),
            );
            let joint = world.add_joint(Box::new(rod));

            // Overlapping circles with a collide_connected joint: the pair
            // produces a solver.
            world.step(FIXED_DT);
            assert!(world.contact_count() > 0);

            world.remove_body(a);
            assert!(!world.contains_body(a));
            assert!(!world.contains_joint(joint));
            assert_eq!(world.contacts().count(), 0);
            assert!(world.body(b).joints().is_empty());
            assert!(world.body(b).is_awake());
        }

        #[test]
        #[should_panic(expected = "stale or removed")]
        fn stale_body_handle_panics() {
            let mut world = quiet_world();
            let a = world.add_body(BodyType::Dynamic, Point2::new(0.0, 0.0), 0.0);
            world.remove_body(a);
            world.body(a);
        }

        #[test]
        fn accumulator_runs_whole_fixed_steps() {
            let mut world = quiet_world();

            world.update(FIXED_DT * 2.5);
            assert_eq!(world.step_count(), 2);

            world.update(FIXED_DT * 0.4);
            assert_eq!(world.step_count(), 2);

            world.update(FIXED_DT * 0.2);
            assert_eq!(world.step_count(), 3);
        }

        #[test]
        fn accumulator_caps_steps_and_drops_backlog() {
            let mut world = quiet_world();

            world.update(FIXED_DT * 6.0);
            assert_eq!(world.step_count(), 4);

            // The two unconsumed steps were dropped, not carried.
            world.update(FIXED_DT * 0.9);
            assert_eq!(world.step_count(), 4);
            world.update(FIXED_DT * 0.2);
            assert_eq!(world.step_count(), 5);
        }
    }
}
