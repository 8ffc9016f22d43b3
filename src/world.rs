//! The force-directed world
//!
//! [`World`] owns the node arena, the edge list and the camera. It is shared
//! between the update, render and growth drivers, so all of its methods take
//! `&self` and synchronize internally:
//!
//! - The graph (nodes, edges, frame counter and the octree scratch space)
//!   sits behind one `RwLock`. Every mutation takes the write lock; drawing and
//!   the accessors take the read lock.
//! - The renderer and the camera's zoom state sit behind a separate `Mutex`.
//!   When both are needed the graph lock is taken first.
//!
//! One [`World::update`] integrates every node, rebuilds the octree, and
//! evaluates repulsion, origin attraction and spring forces for all nodes in
//! parallel. The accelerations are collected first and applied afterwards,
//! so every node sees the same snapshot of positions.

use parking_lot::{Mutex, RwLock};
use rand::Rng;
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::color::Color;
use crate::config::{Config, PhysicsConfig, RendererConfig};
use crate::error::{Error, Result};
use crate::node::{Edge, Node, NodeId};
use crate::octree::{Body, Octree};
use crate::renderer::Renderer;
use crate::surface::{Font, Surface};
use crate::vector::Vector;

const EDGE_COLOR: Color = Color(0xff22_2222);
const OUTLINE_COLOR: Color = Color(0xff55_5555);
const LABEL_FONT: &str = "Lucida Console";
const LABEL_OPACITY: f64 = 0.5;
const LABEL_OPACITY_INTERCEPT: f64 = 1.5;
const LABEL_OFFSET: i32 = 5;

struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    frames: u64,
    octree: Octree,
    /// Per-node accelerations of the current tick
    forces: Vec<Vector>,
}

impl Graph {
    fn check(&self, id: NodeId) -> Result<()> {
        if id.index() < self.nodes.len() {
            Ok(())
        } else {
            Err(Error::UnknownNode(id))
        }
    }

    fn link(&mut self, a: NodeId, b: NodeId) -> Result<()> {
        if a == b {
            return Err(Error::SelfConnection(a));
        }
        self.check(a)?;
        self.check(b)?;
        if self.nodes[a.index()].is_connected_to(b) {
            return Err(Error::AlreadyConnected(a, b));
        }

        self.nodes[a.index()].connected.insert(b);
        self.nodes[b.index()].connected.insert(a);
        self.edges.push(Edge::new(a, b));
        Ok(())
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }
}

struct View {
    renderer: Renderer,
    camera_z: f64,
    camera_z_velocity: f64,
}

/// Graph state, physics and camera for one simulation
pub struct World {
    graph: RwLock<Graph>,
    view: Mutex<View>,
    physics: PhysicsConfig,
    camera_z_acceleration: f64,
    camera_z_easing: f64,
}

impl Default for World {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl World {
    pub fn new(config: &Config) -> Self {
        Self::with_settings(config.physics.clone(), &config.renderer)
    }

    pub fn with_settings(physics: PhysicsConfig, renderer: &RendererConfig) -> Self {
        Self {
            graph: RwLock::new(Graph {
                nodes: Vec::new(),
                edges: Vec::new(),
                frames: 0,
                octree: Octree::new(1.0, physics.repulsion()),
                forces: Vec::new(),
            }),
            view: Mutex::new(View {
                renderer: Renderer::from_config(renderer),
                camera_z: renderer.initial_camera_z,
                camera_z_velocity: 0.0,
            }),
            physics,
            camera_z_acceleration: renderer.camera_z_acceleration,
            camera_z_easing: renderer.camera_z_easing,
        }
    }

    pub fn physics(&self) -> &PhysicsConfig {
        &self.physics
    }

    pub fn add(&self, node: Node) -> NodeId {
        self.graph.write().push(node)
    }

    /// Add several nodes under one lock, returning their ids in order
    pub fn add_range(&self, nodes: impl IntoIterator<Item = Node>) -> Vec<NodeId> {
        let mut graph = self.graph.write();
        nodes.into_iter().map(|node| graph.push(node)).collect()
    }

    /// Connect two distinct, unconnected nodes with an edge
    pub fn connect(&self, a: NodeId, b: NodeId) -> Result<()> {
        self.graph.write().link(a, b)?;
        debug!(%a, %b, "connected nodes");
        Ok(())
    }

    pub fn is_connected(&self, a: NodeId, b: NodeId) -> bool {
        self.graph
            .read()
            .nodes
            .get(a.index())
            .is_some_and(|node| node.is_connected_to(b))
    }

    /// Snapshot of a single node
    pub fn node(&self, id: NodeId) -> Option<Node> {
        self.graph.read().nodes.get(id.index()).cloned()
    }

    /// Snapshot of every node, indexed by id
    pub fn nodes(&self) -> Vec<Node> {
        self.graph.read().nodes.clone()
    }

    pub fn edges(&self) -> Vec<Edge> {
        self.graph.read().edges.clone()
    }

    pub fn node_count(&self) -> usize {
        self.graph.read().nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.read().edges.len()
    }

    /// Ticks run while the world had at least one node
    pub fn frames(&self) -> u64 {
        self.graph.read().frames
    }

    /// Advance the simulation by one tick
    pub fn update(&self) {
        {
            let mut guard = self.graph.write();
            let Graph {
                nodes,
                frames,
                octree,
                forces,
                ..
            } = &mut *guard;

            let mut half_width: f64 = 0.0;
            for node in nodes.iter_mut() {
                node.integrate(self.physics.dampening);
                half_width = half_width.max(node.location.max_abs());
            }

            octree.reset((2.1 * half_width).max(1.0));
            for (index, node) in nodes.iter().enumerate() {
                octree.insert(Body {
                    id: NodeId(index),
                    location: node.location,
                    mass: node.mass(),
                });
            }

            let physics = &self.physics;
            let tree = &*octree;
            let arena = &*nodes;
            arena
                .par_iter()
                .enumerate()
                .map(|(index, node)| net_acceleration(physics, tree, arena, NodeId(index), node))
                .collect_into_vec(forces);

            for (node, force) in nodes.iter_mut().zip(forces.iter()) {
                node.acceleration += *force;
            }

            if !nodes.is_empty() {
                *frames += 1;
            }
            trace!(frames = *frames, nodes = nodes.len(), cells = octree.cell_count(), "tick");
        }

        let mut guard = self.view.lock();
        let view = &mut *guard;
        view.camera_z += view.camera_z_velocity * view.camera_z;
        view.camera_z = view.camera_z.max(1.0);
        view.camera_z_velocity *= self.camera_z_easing;
        view.renderer.dolly(view.camera_z);
    }

    /// Rotate every node about the axis through `pivot` along `direction`
    pub fn rotate(&self, pivot: Vector, direction: Vector, angle: f64) {
        self.graph
            .write()
            .nodes
            .par_iter_mut()
            .for_each(|node| node.rotate(pivot, direction, angle));
    }

    /// Push the camera's zoom velocity; positive deltas move closer
    pub fn move_camera(&self, delta: f64) {
        self.view.lock().camera_z_velocity += delta * self.camera_z_acceleration;
    }

    pub fn stop_camera(&self) {
        self.view.lock().camera_z_velocity = 0.0;
    }

    pub fn camera_z(&self) -> f64 {
        self.view.lock().camera_z
    }

    pub fn camera_z_velocity(&self) -> f64 {
        self.view.lock().camera_z_velocity
    }

    /// Run `f` with the renderer, e.g. to change the light or lens
    pub fn with_renderer<T>(&self, f: impl FnOnce(&mut Renderer) -> T) -> T {
        f(&mut self.view.lock().renderer)
    }

    /// Draw edges, then nodes from farthest to nearest
    pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S, show_labels: bool) {
        let graph = self.graph.read();
        let view = self.view.lock();
        let renderer = &view.renderer;
        let camera_z = renderer.camera().z;

        for edge in &graph.edges {
            let a = graph.nodes[edge.a().index()].location;
            let b = graph.nodes[edge.b().index()].location;
            if a.z < camera_z || b.z < camera_z {
                surface.draw_line(EDGE_COLOR, renderer.project(a), renderer.project(b));
            }
        }

        let mut order: Vec<&Node> = graph.nodes.iter().collect();
        order.sort_by(|a, b| a.location.z.total_cmp(&b.location.z));

        for node in order {
            draw_node(renderer, surface, node, show_labels);
        }
    }

    /// Add `node` connected to a uniformly chosen existing node.
    ///
    /// Picking the partner and inserting happen under one lock, so concurrent
    /// growth never connects to a node that is not there yet.
    pub fn grow<R: Rng + ?Sized>(&self, node: Node, rng: &mut R) -> NodeId {
        let mut graph = self.graph.write();
        let partner = match graph.nodes.len() {
            0 => None,
            n => Some(NodeId(rng.gen_range(0..n))),
        };

        let id = graph.push(node);
        if let Some(partner) = partner {
            // A fresh node has no edges, so linking cannot fail
            if graph.link(id, partner).is_ok() {
                debug!(node = %id, %partner, "grew node");
            }
        }
        id
    }

    /// One attempt at connecting a random unconnected pair
    pub fn try_connect_random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(NodeId, NodeId)> {
        let mut graph = self.graph.write();
        let n = graph.nodes.len();
        if n < 2 {
            return None;
        }

        let a = NodeId(rng.gen_range(0..n));
        let b = NodeId(rng.gen_range(0..n));
        graph.link(a, b).ok()?;
        debug!(%a, %b, "connected random nodes");
        Some((a, b))
    }

    /// Retry [`try_connect_random`](Self::try_connect_random) up to `budget`
    /// times; `false` when every attempt hit a self or duplicate pair
    pub fn connect_random_nodes<R: Rng + ?Sized>(&self, rng: &mut R, budget: usize) -> bool {
        (0..budget).any(|_| self.try_connect_random(rng).is_some())
    }
}

/// Repulsion, origin attraction and spring forces on one node
fn net_acceleration(
    physics: &PhysicsConfig,
    octree: &Octree,
    nodes: &[Node],
    id: NodeId,
    node: &Node,
) -> Vector {
    let mut acc = octree.acceleration(id, node.location);

    let origin_distance = node.location.magnitude();
    if origin_distance > 0.0 {
        let mut coefficient = physics.origin_factor;
        if origin_distance < physics.origin_weak_distance {
            coefficient *= origin_distance / physics.origin_weak_distance;
        }
        let toward_origin = -node.location / origin_distance;
        acc += toward_origin * (coefficient / (origin_distance + physics.origin_epsilon));
    }

    let mass = node.mass();
    let radius = node.radius();
    for other in node.connections() {
        let other = &nodes[other.index()];
        let displacement = node.location.to(other.location);
        let distance = displacement.magnitude();
        if distance == 0.0 {
            continue;
        }
        let ideal = physics.edge_length + radius + other.radius();
        acc += displacement / distance * (physics.edge_factor * (distance - ideal) / mass);
    }

    acc
}

fn draw_node<S: Surface + ?Sized>(renderer: &Renderer, surface: &mut S, node: &Node, show_labels: bool) {
    let radius = node.radius();
    renderer.fill_circle(surface, OUTLINE_COLOR, node.location, radius + 1.0);
    if !renderer.fill_circle(surface, node.color, node.location, radius) {
        return;
    }

    let Some(label) = node.label.as_deref().filter(|_| show_labels) else {
        return;
    };

    let scale = renderer.scale_at(node.location);
    let distance = node.location.distance(renderer.camera());
    let opacity = (LABEL_OPACITY_INTERCEPT - distance / 1000.0).clamp(0.0, 1.0) * LABEL_OPACITY;
    let alpha = (255.0 * opacity).round() as u8;
    if alpha <= 1 || scale <= 0.0 {
        return;
    }

    let font = Font::new(LABEL_FONT, (scale * 10.0).round() / 10.0);
    let offset = (radius * scale).round() as i32 + LABEL_OFFSET;
    let at = renderer.project(node.location).offset(offset, 0);
    surface.draw_text(label, &font, Color::WHITE.with_alpha(alpha), at);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawCommand, DrawList, ScreenPoint};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn node_at(x: f64, y: f64, z: f64) -> Node {
        Node::new(None, Color::WHITE, Vector::new(x, y, z))
    }

    fn world_with(nodes: usize) -> (World, Vec<NodeId>) {
        let world = World::default();
        let ids = world.add_range((0..nodes).map(|i| node_at(i as f64 * 40.0, 0.0, 0.0)));
        (world, ids)
    }

    #[test]
    fn add_assigns_sequential_ids() {
        let world = World::default();
        assert_eq!(world.add(node_at(0.0, 0.0, 0.0)), NodeId(0));
        assert_eq!(world.add_range([node_at(1.0, 0.0, 0.0), node_at(2.0, 0.0, 0.0)]), vec![NodeId(1), NodeId(2)]);
        assert_eq!(world.node_count(), 3);
    }

    #[test]
    fn connect_is_symmetric() {
        let (world, ids) = world_with(2);
        world.connect(ids[0], ids[1]).unwrap();

        assert!(world.is_connected(ids[0], ids[1]));
        assert!(world.is_connected(ids[1], ids[0]));
        assert_eq!(world.edge_count(), 1);
        assert_eq!(world.edges()[0].endpoints(), (ids[0], ids[1]));
        assert_eq!(world.node(ids[0]).unwrap().mass(), 6.0);
    }

    #[test]
    fn duplicate_connect_is_rejected() {
        let (world, ids) = world_with(2);
        world.connect(ids[0], ids[1]).unwrap();

        let err = world.connect(ids[1], ids[0]).unwrap_err();
        assert!(matches!(err, Error::AlreadyConnected(a, b) if a == ids[1] && b == ids[0]));
        assert_eq!(world.edge_count(), 1);
    }

    #[test]
    fn self_connect_is_an_error() {
        let (world, ids) = world_with(1);
        assert!(matches!(world.connect(ids[0], ids[0]), Err(Error::SelfConnection(_))));
        assert_eq!(world.edge_count(), 0);
    }

    #[test]
    fn unknown_node_is_an_error() {
        let (world, ids) = world_with(1);
        assert!(matches!(
            world.connect(ids[0], NodeId(9)),
            Err(Error::UnknownNode(NodeId(9)))
        ));
        assert!(!world.is_connected(NodeId(9), ids[0]));
    }

    #[test]
    fn isolated_node_approaches_origin() {
        let world = World::default();
        let id = world.add(node_at(500.0, 0.0, 0.0));

        world.update();
        let mut previous = world.node(id).unwrap().location.magnitude();
        assert_eq!(previous, 500.0);

        for _ in 0..30 {
            world.update();
            let distance = world.node(id).unwrap().location.magnitude();
            assert!(distance < previous, "{distance} >= {previous}");
            previous = distance;
        }
        assert!(previous > world.physics().origin_weak_distance);
    }

    #[test]
    fn node_at_origin_stays_put() {
        let world = World::default();
        let id = world.add(node_at(0.0, 0.0, 0.0));
        for _ in 0..5 {
            world.update();
        }
        assert_eq!(world.node(id).unwrap().location, Vector::ZERO);
    }

    #[test]
    fn locked_nodes_never_move() {
        let world = World::default();
        let a = world.add(node_at(100.0, 0.0, 0.0).locked());
        let b = world.add(node_at(-100.0, 20.0, 0.0).locked());
        world.connect(a, b).unwrap();

        for _ in 0..50 {
            world.update();
        }
        assert_eq!(world.node(a).unwrap().location, Vector::new(100.0, 0.0, 0.0));
        assert_eq!(world.node(b).unwrap().location, Vector::new(-100.0, 20.0, 0.0));
        assert_eq!(world.frames(), 50);
    }

    #[test]
    fn spring_pulls_distant_neighbors_together() {
        let world = World::default();
        let a = world.add(node_at(-400.0, 0.0, 0.0));
        let b = world.add(node_at(400.0, 0.0, 0.0));
        world.connect(a, b).unwrap();

        let gap = |w: &World| w.node(a).unwrap().location.distance(w.node(b).unwrap().location);
        let start = gap(&world);
        for _ in 0..20 {
            world.update();
        }
        assert!(gap(&world) < start);
    }

    #[test]
    fn empty_world_does_not_count_frames() {
        let world = World::default();
        world.update();
        assert_eq!(world.frames(), 0);
    }

    #[test]
    fn camera_zoom_eases_and_clamps() {
        let world = World::default();
        assert_eq!(world.camera_z(), 5000.0);

        world.move_camera(10.0);
        assert!((world.camera_z_velocity() + 2e-3).abs() < 1e-12);
        world.update();
        assert!((world.camera_z() - 4990.0).abs() < 1e-9);
        assert!((world.camera_z_velocity() + 2e-3 * 0.94).abs() < 1e-12);
        assert_eq!(world.with_renderer(|r| r.camera().z), world.camera_z());

        world.stop_camera();
        world.move_camera(1e6);
        world.update();
        assert_eq!(world.camera_z(), 1.0);
    }

    #[test]
    fn rotate_turns_every_node() {
        let (world, ids) = world_with(3);
        world.rotate(Vector::ZERO, Vector::Z_AXIS, std::f64::consts::PI);

        let moved = world.node(ids[2]).unwrap().location;
        assert!(moved.distance(Vector::new(-80.0, 0.0, 0.0)) < 1e-9, "{moved}");
    }

    #[test]
    fn grow_connects_to_existing_node() {
        let mut rng = StdRng::seed_from_u64(5);
        let world = World::default();

        let first = world.grow(node_at(0.0, 0.0, 0.0), &mut rng);
        assert_eq!(world.edge_count(), 0);

        let second = world.grow(node_at(10.0, 0.0, 0.0), &mut rng);
        assert!(world.is_connected(first, second));

        for i in 0..20 {
            world.grow(node_at(i as f64, 1.0, 0.0), &mut rng);
        }
        assert_eq!(world.node_count(), 22);
        assert_eq!(world.edge_count(), 21);
    }

    #[test]
    fn random_connection_fails_on_complete_graph() {
        let mut rng = StdRng::seed_from_u64(9);
        let (world, ids) = world_with(3);
        world.connect(ids[0], ids[1]).unwrap();
        world.connect(ids[1], ids[2]).unwrap();
        world.connect(ids[0], ids[2]).unwrap();

        assert!(!world.connect_random_nodes(&mut rng, 6));
        assert_eq!(world.edge_count(), 3);
    }

    #[test]
    fn random_connection_needs_two_nodes() {
        let mut rng = StdRng::seed_from_u64(1);
        let (world, _) = world_with(1);
        assert!(world.try_connect_random(&mut rng).is_none());
    }

    #[test]
    fn random_connection_adds_an_edge() {
        let mut rng = StdRng::seed_from_u64(2);
        let (world, _) = world_with(10);
        assert!(world.connect_random_nodes(&mut rng, 20));
        assert_eq!(world.edge_count(), 1);
    }

    #[test]
    fn draw_puts_edges_under_nodes_far_to_near() {
        let world = World::default();
        let near = world.add(Node::new(Some("near".into()), Color(0xff00_3f3f), Vector::new(0.0, 0.0, 100.0)));
        let far = world.add(node_at(50.0, 0.0, -100.0));
        world.connect(near, far).unwrap();
        world.with_renderer(|r| r.set_camera(Vector::new(0.0, 0.0, 1000.0)));

        let mut list = DrawList::new(800, 600);
        world.draw(&mut list, true);
        let commands = list.commands();

        assert!(matches!(commands[0], DrawCommand::Line { color, .. } if color == EDGE_COLOR));
        // far outline, far body, near outline, near body, near label
        assert_eq!(commands.len(), 6);
        assert!(matches!(commands[1], DrawCommand::Ellipse { color, .. } if color == OUTLINE_COLOR));
        assert!(matches!(commands[2], DrawCommand::Ellipse { color, .. } if color == Color::WHITE));
        assert!(matches!(commands[4], DrawCommand::Ellipse { color, .. } if color == Color(0xff00_3f3f)));
        assert_eq!(list.texts(), vec!["near"]);
    }

    #[test]
    fn label_is_placed_right_of_the_node() {
        let world = World::default();
        world.add(Node::new(Some("a".into()), Color::WHITE, Vector::ZERO).locked());
        world.with_renderer(|r| r.set_camera(Vector::new(0.0, 0.0, 1000.0)));

        let mut list = DrawList::new(800, 600);
        world.draw(&mut list, true);

        // Camera 1000 away with fov 1400: scale 1000 / 1400
        let scale = 1000.0 / 1400.0;
        let radius = Node::new(None, Color::WHITE, Vector::ZERO).radius();
        let expected_x = (radius * scale).round() as i32 + LABEL_OFFSET;
        match list.commands().last().unwrap() {
            DrawCommand::Text { font, color, at, .. } => {
                assert_eq!(*at, ScreenPoint::new(expected_x, 0));
                assert_eq!(font.family, LABEL_FONT);
                assert_eq!(font.size, 0.7);
                assert_eq!(color.a(), 64);
            }
            other => panic!("Expected label, got {other:?}"),
        }
    }

    #[test]
    fn labels_can_be_hidden() {
        let world = World::default();
        world.add(Node::new(Some("a".into()), Color::WHITE, Vector::ZERO));
        world.with_renderer(|r| r.set_camera(Vector::new(0.0, 0.0, 1000.0)));

        let mut list = DrawList::new(800, 600);
        world.draw(&mut list, false);
        assert!(list.texts().is_empty());
    }

    #[test]
    fn nodes_behind_camera_are_skipped() {
        let world = World::default();
        world.add(Node::new(Some("behind".into()), Color::WHITE, Vector::new(0.0, 0.0, 6000.0)));

        let mut list = DrawList::new(800, 600);
        world.draw(&mut list, true);
        assert!(list.commands().is_empty());
    }
}
