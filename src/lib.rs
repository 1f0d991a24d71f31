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

//! A low-level 2D rigid body physics library intended for use in 2D video
//! game development.
//!
//! # Simulation overview
//!
//! A `World` owns bodies and joints in generation-counted pools and is
//! advanced either by `World::step` directly or through the fixed-step
//! `World::update` accumulator. Every step:
//!
//! - integrates gravity and accumulated forces into velocities;
//! - collides the shapes of every eligible body pair, producing up to two
//!   contact points per shape pair;
//! - solves the velocity constraints of joints and contacts with an
//!   iterative sequential impulse solver, warm started from the impulses
//!   accumulated on the previous step;
//! - integrates positions, then corrects residual penetration and joint
//!   error with a separate position solver;
//! - puts every dynamic body to sleep once the whole scene has come to
//!   rest.
//!
//! Shapes are circles and convex polygons (`Shape`); bodies are `Static`,
//! `Kinetic` or `Dynamic` (`BodyType`); joints implement the `Joint`
//! trait, with `DistanceJoint` and `RevoluteJoint` provided. Bodies and
//! joints are addressed through generation-counted handles that detect
//! use-after-remove.

#[macro_use]
pub extern crate cgmath;
extern crate smallvec;

#[cfg(test)]
#[macro_use]
extern crate approx;

mod bounds;
pub use bounds::*;

mod collision;
pub use collision::*;

mod geom;
pub use geom::*;

mod joint;
pub use joint::*;

mod math;
pub use math::*;

mod physics;
pub use physics::*;

mod pool;
pub use pool::*;

mod solver;
pub use solver::*;

mod world;
pub use world::*;
