//! Seeding and growing the graph
//!
//! The world starts from a fixed frame of locked anchors: a row of inputs
//! along the top and a row of outputs along the bottom. Optionally a bulk
//! random graph is added on top; after that the background drivers keep
//! growing it one node and one edge at a time.

use rand::Rng;
use tracing::info;

use crate::color::Color;
use crate::config::BulkConfig;
use crate::error::Result;
use crate::node::{Node, NodeId};
use crate::random;
use crate::vector::Vector;
use crate::world::World;

pub const INPUT_COUNT: usize = 14;
pub const OUTPUT_COUNT: usize = 3;
pub const INPUT_COLOR: Color = Color(0x7fff_00ff);
pub const OUTPUT_COLOR: Color = Color(0xffff_7f3f);

/// Anchors span x in `[-ANCHOR_SPREAD / 2, ANCHOR_SPREAD / 2]`
const ANCHOR_SPREAD: f64 = 1000.0;
/// Inputs sit at `y = ANCHOR_HEIGHT`, outputs at `-ANCHOR_HEIGHT`
const ANCHOR_HEIGHT: f64 = 500.0;

fn anchor(label: String, color: Color, location: Vector) -> Node {
    Node::new(Some(label), color.with_alpha(0xff), location).locked()
}

/// x coordinate of anchor `i` out of `count`, evenly spread
fn anchor_offset(i: usize, count: usize) -> f64 {
    i as f64 * ANCHOR_SPREAD / (count - 1) as f64 - ANCHOR_SPREAD / 2.0
}

/// Add the locked input and output anchors
pub fn seed_anchors(world: &World) -> Vec<NodeId> {
    let inputs = (0..INPUT_COUNT).map(|i| {
        anchor(
            format!("Input {}", i + 1),
            INPUT_COLOR,
            Vector::new(anchor_offset(i, INPUT_COUNT), ANCHOR_HEIGHT, 0.0),
        )
    });
    let outputs = (0..OUTPUT_COUNT).map(|i| {
        anchor(
            format!("Output {}", i + 1),
            OUTPUT_COLOR,
            Vector::new(anchor_offset(i, OUTPUT_COUNT), -ANCHOR_HEIGHT, 0.0),
        )
    });

    let ids = world.add_range(inputs.chain(outputs));
    info!(inputs = INPUT_COUNT, outputs = OUTPUT_COUNT, "seeded anchors");
    ids
}

/// A node at a random location with a random numeric label
pub fn random_node<R: Rng + ?Sized>(rng: &mut R, color: Color) -> Node {
    let label = random::label(rng);
    Node::random(rng, Some(label), color)
}

/// Build the bulk random graph: a connected-ish basis, a group hanging off
/// the basis, outliers hanging off anything, then a few cross links
pub fn populate<R: Rng + ?Sized>(
    world: &World,
    rng: &mut R,
    bulk: &BulkConfig,
    color: Color,
) -> Result<()> {
    let basis = world.add_range((0..bulk.basis).map(|_| random_node(rng, color)));

    for _ in 0..bulk.basis_connections {
        world.connect_random_nodes(rng, world.node_count() * 2);
    }

    if !basis.is_empty() {
        for _ in 0..bulk.group {
            let node = world.add(random_node(rng, color));
            let partner = basis[rng.gen_range(0..basis.len())];
            world.connect(node, partner)?;
        }
    }

    for _ in 0..bulk.outliers {
        let node = random_node(rng, color);
        world.grow(node, rng);
    }

    for _ in 0..bulk.extra_connections {
        world.connect_random_nodes(rng, world.node_count() * 2);
    }

    info!(
        nodes = world.node_count(),
        edges = world.edge_count(),
        "populated bulk graph"
    );
    Ok(())
}
