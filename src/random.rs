//! Random sampling of locations and directions

use rand::Rng;

use crate::vector::Vector;

/// A random vector with uniformly random direction and a magnitude in
/// `[0, max_magnitude)`
pub fn vector<R: Rng + ?Sized>(rng: &mut R, max_magnitude: f64) -> Vector {
    direction(rng) * (max_magnitude * rng.r#gen::<f64>())
}

/// A random unit vector.
///
/// Samples the cube `[-1, 1)^3` and normalizes, retrying the (practically
/// impossible) zero sample.
pub fn direction<R: Rng + ?Sized>(rng: &mut R) -> Vector {
    loop {
        let v = Vector::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        let magnitude = v.magnitude();
        if magnitude > 0.0 {
            return v / magnitude;
        }
    }
}

/// A random label for generated nodes
pub fn label<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.gen_range(0..i32::MAX).to_string()
}
