//! 3D vector algebra
//!
//! `Vector` is a plain `Copy` value: every operation returns a new vector.
//! Equality is exact field-wise comparison.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// A point or direction in 3D space
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector {
    pub const ZERO: Vector = Vector::new(0.0, 0.0, 0.0);
    pub const X_AXIS: Vector = Vector::new(1.0, 0.0, 0.0);
    pub const Y_AXIS: Vector = Vector::new(0.0, 1.0, 0.0);
    pub const Z_AXIS: Vector = Vector::new(0.0, 0.0, 1.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vector) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vector) -> Vector {
        Vector::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn magnitude(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction.
    ///
    /// Produces NaN components for the zero vector; callers must guard.
    pub fn unit(self) -> Vector {
        self / self.magnitude()
    }

    pub fn distance(self, other: Vector) -> f64 {
        (self - other).magnitude()
    }

    /// The vector from `self` to `other`
    pub fn to(self, other: Vector) -> Vector {
        other - self
    }

    /// Angle between two vectors in radians.
    ///
    /// Rounding can push the cosine slightly outside [-1, 1] for
    /// (anti)parallel inputs, in which case the result is NaN.
    pub fn angle(self, other: Vector) -> f64 {
        (self.dot(other) / (self.magnitude() * other.magnitude())).acos()
    }

    /// Component of `self` along `onto`
    pub fn projection(self, onto: Vector) -> Vector {
        onto * (self.dot(onto) / onto.dot(onto))
    }

    /// Component of `self` perpendicular to `onto`
    pub fn rejection(self, onto: Vector) -> Vector {
        self - self.projection(onto)
    }

    /// Largest absolute coordinate
    pub fn max_abs(self) -> f64 {
        self.x.abs().max(self.y.abs()).max(self.z.abs())
    }

    /// Mean of a non-empty collection of vectors
    pub fn average(vectors: &[Vector]) -> Vector {
        debug_assert!(!vectors.is_empty(), "average of an empty collection");
        vectors.iter().copied().sum::<Vector>() / vectors.len() as f64
    }

    /// Rotate this point by `angle` radians about the axis through `pivot`
    /// with the given `direction` (right-hand rule).
    ///
    /// `direction` is normalized here and must not be the zero vector.
    pub fn rotate(self, pivot: Vector, direction: Vector, angle: f64) -> Vector {
        let k = direction.unit();
        let v = self - pivot;
        let (sin, cos) = angle.sin_cos();

        // Rodrigues: v cos + (k x v) sin + k (k . v)(1 - cos)
        let rotated = v * cos + k.cross(v) * sin + k * (k.dot(v) * (1.0 - cos));
        rotated + pivot
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {} {}]", self.x, self.y, self.z)
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, other: Vector) -> Vector {
        Vector::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, other: Vector) -> Vector {
        Vector::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Neg for Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        Vector::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;

    fn mul(self, scalar: f64) -> Vector {
        Vector::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl Mul<Vector> for f64 {
    type Output = Vector;

    fn mul(self, vector: Vector) -> Vector {
        vector * self
    }
}

impl Div<f64> for Vector {
    type Output = Vector;

    fn div(self, scalar: f64) -> Vector {
        let inv = 1.0 / scalar;
        Vector::new(self.x * inv, self.y * inv, self.z * inv)
    }
}

impl AddAssign for Vector {
    fn add_assign(&mut self, other: Vector) {
        *self = *self + other;
    }
}

impl SubAssign for Vector {
    fn sub_assign(&mut self, other: Vector) {
        *self = *self - other;
    }
}

impl MulAssign<f64> for Vector {
    fn mul_assign(&mut self, scalar: f64) {
        *self = *self * scalar;
    }
}

impl Sum for Vector {
    fn sum<I: Iterator<Item = Vector>>(iter: I) -> Vector {
        iter.fold(Vector::ZERO, |acc, v| acc + v)
    }
}
