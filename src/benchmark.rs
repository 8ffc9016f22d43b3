//! Direct vs. Barnes-Hut repulsion timing
//!
//! Bodies are placed deterministically along sine/cosine curves so runs are
//! comparable without a random seed.

use std::fmt;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::Serialize;

use crate::node::NodeId;
use crate::octree::{Body, Octree, RepulsionParams, direct_acceleration};
use crate::vector::Vector;

/// Node counts used when none are given
pub const DEFAULT_SIZES: [usize; 5] = [250, 500, 1000, 2000, 4000];

/// Timing and accuracy of one problem size
#[derive(Debug, Clone, Serialize)]
pub struct BenchResult {
    pub nodes: usize,
    pub theta: f64,
    pub direct: Duration,
    /// Tree build plus all queries
    pub tree: Duration,
    pub cells: usize,
    /// Largest `|tree - direct| / |direct|` over all bodies
    pub max_error: f64,
    pub mean_error: f64,
}

impl BenchResult {
    pub fn speedup(&self) -> f64 {
        self.direct.as_secs_f64() / self.tree.as_secs_f64()
    }
}

impl fmt::Display for BenchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "N = {:5}, direct = {:9.6} s, BH = {:9.6} s, speedup = {:6.2}x, cells = {:6}, max err = {:.4}, mean err = {:.4}",
            self.nodes,
            self.direct.as_secs_f64(),
            self.tree.as_secs_f64(),
            self.speedup(),
            self.cells,
            self.max_error,
            self.mean_error,
        )
    }
}

/// `n` bodies spread over a cube of half-width `spread`
pub fn make_bodies(n: usize, spread: f64) -> Vec<Body> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            Body {
                id: NodeId(i),
                location: Vector::new(
                    (t * 0.37).sin() * spread,
                    (t * 0.13).cos() * spread,
                    (t * 0.07).sin() * spread,
                ),
                mass: 6.0 + (i % 5) as f64,
            }
        })
        .collect()
}

/// Time exact and tree repulsion for every body and compare the results
pub fn compare(bodies: &[Body], params: RepulsionParams) -> BenchResult {
    let half_width = bodies
        .iter()
        .map(|b| b.location.max_abs())
        .fold(0.0, f64::max);

    let started = Instant::now();
    let exact: Vec<Vector> = bodies
        .par_iter()
        .map(|b| direct_acceleration(bodies, b.id, b.location, &params))
        .collect();
    let direct = started.elapsed();

    let started = Instant::now();
    let mut tree = Octree::new((2.1 * half_width).max(1.0), params);
    for body in bodies {
        tree.insert(*body);
    }
    let approx: Vec<Vector> = bodies
        .par_iter()
        .map(|b| tree.acceleration(b.id, b.location))
        .collect();
    let tree_time = started.elapsed();

    let errors: Vec<f64> = exact
        .iter()
        .zip(&approx)
        .map(|(e, a)| {
            let magnitude = e.magnitude();
            if magnitude == 0.0 {
                a.magnitude()
            } else {
                e.distance(*a) / magnitude
            }
        })
        .collect();

    BenchResult {
        nodes: bodies.len(),
        theta: params.theta,
        direct,
        tree: tree_time,
        cells: tree.cell_count(),
        max_error: errors.iter().copied().fold(0.0, f64::max),
        mean_error: if errors.is_empty() {
            0.0
        } else {
            errors.iter().sum::<f64>() / errors.len() as f64
        },
    }
}

/// Run [`compare`] for each size, warming up once per size
pub fn run(sizes: &[usize], params: RepulsionParams) -> Vec<BenchResult> {
    sizes
        .iter()
        .map(|&n| {
            let bodies = make_bodies(n, 1000.0);
            compare(&bodies, params);
            compare(&bodies, params)
        })
        .collect()
}
