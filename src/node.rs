//! Physical model of graph nodes and the edges between them

use std::collections::BTreeSet;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::random;
use crate::vector::Vector;

/// Default velocity dampening applied after every integration step
pub const DEFAULT_DAMPENING: f64 = 0.4;

/// Random node locations have a magnitude in [0, RADIUS_RANGE)
pub const RADIUS_RANGE: f64 = 1000.0;

/// Mass added on top of the connection count
const BASE_MASS: f64 = 5.0;

/// Stable handle to a node in a [`World`](crate::world::World).
///
/// Nodes are never removed, so an id stays valid for the world's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A particle in the force-directed layout
#[derive(Debug, Clone)]
pub struct Node {
    pub location: Vector,
    pub velocity: Vector,
    pub acceleration: Vector,
    pub color: Color,
    pub label: Option<String>,
    /// Frozen in place; forces still accumulate and reset each tick
    pub locked: bool,
    pub(crate) connected: BTreeSet<NodeId>,
}

/// Radius for a given mass
pub fn radius_for_mass(mass: f64) -> f64 {
    2.8 * mass.cbrt()
}

impl Node {
    /// Create an unlocked, unconnected node at rest
    pub fn new(label: Option<String>, color: Color, location: Vector) -> Self {
        Self {
            location,
            velocity: Vector::ZERO,
            acceleration: Vector::ZERO,
            color,
            label,
            locked: false,
            connected: BTreeSet::new(),
        }
    }

    /// Create a node at a random location within [`RADIUS_RANGE`] of the origin
    pub fn random<R: Rng + ?Sized>(rng: &mut R, label: Option<String>, color: Color) -> Self {
        Self::new(label, color, random::vector(rng, RADIUS_RANGE))
    }

    /// Lock the node in place (builder style)
    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    /// `max(1, connections) + 5`; denser nodes accelerate less
    pub fn mass(&self) -> f64 {
        self.connected.len().max(1) as f64 + BASE_MASS
    }

    pub fn radius(&self) -> f64 {
        radius_for_mass(self.mass())
    }

    pub fn is_connected_to(&self, other: NodeId) -> bool {
        self.connected.contains(&other)
    }

    /// Neighbors in ascending id order
    pub fn connections(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.connected.iter().copied()
    }

    pub fn degree(&self) -> usize {
        self.connected.len()
    }

    /// Advance one time step and clear the accumulated acceleration
    pub fn integrate(&mut self, dampening: f64) {
        if !self.locked {
            self.velocity += self.acceleration;
            self.location += self.velocity;
        }

        self.velocity *= dampening;
        self.acceleration = Vector::ZERO;
    }

    /// Rotate about the axis through `pivot` along `direction`.
    ///
    /// Velocity and acceleration are free vectors, so they are shifted into
    /// the pivot's frame before rotating and shifted back afterwards.
    pub fn rotate(&mut self, pivot: Vector, direction: Vector, angle: f64) {
        self.location = self.location.rotate(pivot, direction, angle);
        self.velocity = (self.velocity + pivot).rotate(pivot, direction, angle) - pivot;
        self.acceleration = (self.acceleration + pivot).rotate(pivot, direction, angle) - pivot;
    }
}

/// An undirected spring between two distinct nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    a: NodeId,
    b: NodeId,
}

impl Edge {
    pub(crate) fn new(a: NodeId, b: NodeId) -> Self {
        debug_assert_ne!(a, b);
        Self { a, b }
    }

    pub fn a(&self) -> NodeId {
        self.a
    }

    pub fn b(&self) -> NodeId {
        self.b
    }

    pub fn endpoints(&self) -> (NodeId, NodeId) {
        (self.a, self.b)
    }
}
