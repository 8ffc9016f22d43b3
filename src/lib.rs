//! forcelattice - A 3D force-directed graph layout engine.
//!
//! Nodes repel each other through a Barnes-Hut octree, edges act as springs
//! and everything is drawn weakly toward the origin. The [`World`] integrates
//! the layout tick by tick, the [`Renderer`] projects it onto any
//! [`Surface`], and a [`Simulation`] runs the update, render and growth
//! drivers on tokio.

pub mod benchmark;
pub mod color;
pub mod config;
pub mod error;
pub mod generator;
pub mod input;
pub mod node;
pub mod octree;
pub mod random;
pub mod renderer;
pub mod simulation;
pub mod surface;
pub mod vector;
pub mod world;

pub use color::Color;
pub use config::Config;
pub use error::{Error, Result};
pub use node::{Edge, Node, NodeId};
pub use renderer::Renderer;
pub use simulation::Simulation;
pub use surface::{DrawList, Surface};
pub use vector::Vector;
pub use world::World;
