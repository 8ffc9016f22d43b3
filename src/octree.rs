//! Barnes-Hut octree for approximating node repulsion
//!
//! The tree is rebuilt from scratch every tick. Space is recursively split
//! into eight octants; every cell tracks the total mass and mass moment of
//! the bodies below it, so a distant cluster can stand in for all of its
//! members as one pseudo-body at its center of mass.
//!
//! - Cells live in an arena (`Vec<Cell>`) and refer to their children by
//!   index. [`Octree::reset`] clears the arena but keeps its allocation, so a
//!   long-running simulation does not allocate a fresh tree each tick.
//! - A leaf normally holds one body. Cells at [`MAX_DEPTH`] stop splitting and
//!   chain extra bodies instead, which keeps coincident bodies from recursing
//!   forever.
//! - Octant selection sends a coordinate `>=` the cell center to the positive
//!   half, so bodies on a boundary are placed deterministically.
//!
//! The root must enclose every inserted body. Sizing it is the caller's job;
//! a body outside the root is still inserted but its aggregation is
//! geometrically wrong.

use serde::{Deserialize, Serialize};

use crate::node::NodeId;
use crate::vector::Vector;

/// Default opening threshold (half-width / distance)
pub const DEFAULT_THETA: f64 = 0.5;

/// Default repulsion constant; negative so the force points away
pub const DEFAULT_REPULSION_FACTOR: f64 = -900.0;

/// Default distance softening for repulsion
pub const DEFAULT_REPULSION_EPSILON: f64 = 2.0;

/// Depth at which cells stop subdividing
pub const MAX_DEPTH: u32 = 40;

const ROOT: usize = 0;

/// Force law and accuracy knob for tree queries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepulsionParams {
    /// 0 gives exact pairwise repulsion
    pub theta: f64,
    pub factor: f64,
    pub epsilon: f64,
}

impl Default for RepulsionParams {
    fn default() -> Self {
        Self {
            theta: DEFAULT_THETA,
            factor: DEFAULT_REPULSION_FACTOR,
            epsilon: DEFAULT_REPULSION_EPSILON,
        }
    }
}

impl RepulsionParams {
    /// Acceleration felt at `at` from a point mass at `source`
    pub fn pairwise(&self, at: Vector, source: Vector, mass: f64) -> Vector {
        let displacement = at.to(source);
        let distance = displacement.magnitude();
        if distance == 0.0 {
            return Vector::ZERO;
        }

        let softened = distance + self.epsilon;
        displacement / distance * (self.factor * mass / (softened * softened))
    }
}

/// A point mass inserted into the tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub id: NodeId,
    pub location: Vector,
    pub mass: f64,
}

#[derive(Debug)]
struct Cell {
    center: Vector,
    half_width: f64,
    depth: u32,
    count: usize,
    mass: f64,
    /// Sum of `location * mass`
    moment: Vector,
    children: [Option<usize>; 8],
    /// First body of the occupant chain (leaves only)
    occupant: Option<usize>,
}

impl Cell {
    fn new(center: Vector, half_width: f64, depth: u32) -> Self {
        Self {
            center,
            half_width,
            depth,
            count: 0,
            mass: 0.0,
            moment: Vector::ZERO,
            children: [None; 8],
            occupant: None,
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    fn contains(&self, point: Vector) -> bool {
        let d = point - self.center;
        d.x.abs() <= self.half_width && d.y.abs() <= self.half_width && d.z.abs() <= self.half_width
    }

    fn center_of_mass(&self) -> Vector {
        self.moment / self.mass
    }

    fn absorb(&mut self, body: &Body) {
        self.count += 1;
        self.mass += body.mass;
        self.moment += body.location * body.mass;
    }
}

#[derive(Debug)]
struct Slot {
    body: Body,
    next: Option<usize>,
}

/// Barnes-Hut octree over the bodies of one tick
#[derive(Debug)]
pub struct Octree {
    cells: Vec<Cell>,
    slots: Vec<Slot>,
    params: RepulsionParams,
}

impl Octree {
    /// Create an empty tree whose root cube is centered at the origin
    pub fn new(root_half_width: f64, params: RepulsionParams) -> Self {
        let mut tree = Self {
            cells: Vec::new(),
            slots: Vec::new(),
            params,
        };
        tree.reset(root_half_width);
        tree
    }

    /// Empty the tree and resize the root, keeping allocations
    pub fn reset(&mut self, root_half_width: f64) {
        self.cells.clear();
        self.slots.clear();
        self.cells.push(Cell::new(Vector::ZERO, root_half_width, 0));
    }

    pub fn params(&self) -> RepulsionParams {
        self.params
    }

    pub fn root_half_width(&self) -> f64 {
        self.cells[ROOT].half_width
    }

    /// Number of inserted bodies
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of allocated cells, including empty lazily-created children
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Total mass and center of mass of everything inserted
    pub fn aggregate(&self) -> Option<(f64, Vector)> {
        let root = &self.cells[ROOT];
        (root.count > 0).then(|| (root.mass, root.center_of_mass()))
    }

    /// Insert a body, splitting occupied leaves on the way down
    pub fn insert(&mut self, body: Body) {
        let slot = self.slots.len();
        self.slots.push(Slot { body, next: None });

        let mut cell = ROOT;
        loop {
            self.cells[cell].absorb(&body);

            if self.cells[cell].count == 1 {
                self.cells[cell].occupant = Some(slot);
                return;
            }

            if self.cells[cell].is_leaf() {
                if self.cells[cell].depth >= MAX_DEPTH {
                    self.slots[slot].next = self.cells[cell].occupant;
                    self.cells[cell].occupant = Some(slot);
                    return;
                }

                // Push the resident body one level down before descending
                if let Some(resident) = self.cells[cell].occupant.take() {
                    let resident_body = self.slots[resident].body;
                    let child = self.child_for(cell, resident_body.location);
                    self.cells[child].absorb(&resident_body);
                    self.cells[child].occupant = Some(resident);
                }
            }

            cell = self.child_for(cell, body.location);
        }
    }

    /// Repulsive acceleration on the body `id` located at `location`
    pub fn acceleration(&self, id: NodeId, location: Vector) -> Vector {
        let mut acc = Vector::ZERO;
        self.accumulate(ROOT, id, location, &mut acc);
        acc
    }

    fn accumulate(&self, index: usize, id: NodeId, location: Vector, acc: &mut Vector) {
        let cell = &self.cells[index];
        if cell.count == 0 {
            return;
        }

        if cell.is_leaf() {
            let mut next = cell.occupant;
            while let Some(slot) = next {
                let Slot { body, next: following } = &self.slots[slot];
                if body.id != id {
                    *acc += self.params.pairwise(location, body.location, body.mass);
                }
                next = *following;
            }
            return;
        }

        let distance = location.distance(cell.center);
        if !cell.contains(location) && cell.half_width < self.params.theta * distance {
            *acc += self
                .params
                .pairwise(location, cell.center_of_mass(), cell.mass);
            return;
        }

        for child in cell.children.iter().flatten() {
            self.accumulate(*child, id, location, acc);
        }
    }

    /// Index of the child octant holding `point`, created on demand
    fn child_for(&mut self, cell: usize, point: Vector) -> usize {
        let parent = &self.cells[cell];
        let octant = octant_of(point, parent.center);

        if let Some(child) = parent.children[octant] {
            return child;
        }

        let half = parent.half_width * 0.5;
        let offset = Vector::new(
            if octant & 1 != 0 { half } else { -half },
            if octant & 2 != 0 { half } else { -half },
            if octant & 4 != 0 { half } else { -half },
        );
        let child = Cell::new(parent.center + offset, half, parent.depth + 1);

        let index = self.cells.len();
        self.cells.push(child);
        self.cells[cell].children[octant] = Some(index);
        index
    }
}

/// Octant bits: 1 = +x, 2 = +y, 4 = +z; ties go positive
fn octant_of(point: Vector, center: Vector) -> usize {
    let mut octant = 0;
    if point.x >= center.x {
        octant |= 1;
    }
    if point.y >= center.y {
        octant |= 2;
    }
    if point.z >= center.z {
        octant |= 4;
    }
    octant
}

/// Exact O(n²) repulsion on `id` from every other body
pub fn direct_acceleration(
    bodies: &[Body],
    id: NodeId,
    location: Vector,
    params: &RepulsionParams,
) -> Vector {
    bodies
        .iter()
        .filter(|b| b.id != id)
        .map(|b| params.pairwise(location, b.location, b.mass))
        .sum()
}
