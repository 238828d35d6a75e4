//! Points and vectors in three dimensions
use num::Zero;
use std::ops::{Add, AddAssign, Div, Index, Mul, Neg, Sub, SubAssign};

/// A point or vector in 3D
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vect3(pub [f64; 3]);

impl Vect3 {
    /// Create a vector from its coordinates
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self([x, y, z])
    }

    /// Dot product
    pub fn dot(&self, other: &Self) -> f64 {
        self.0[0] * other.0[0] + self.0[1] * other.0[1] + self.0[2] * other.0[2]
    }

    /// Cross product
    pub fn cross(&self, other: &Self) -> Self {
        Self([
            self.0[1] * other.0[2] - self.0[2] * other.0[1],
            self.0[2] * other.0[0] - self.0[0] * other.0[2],
            self.0[0] * other.0[1] - self.0[1] * other.0[0],
        ])
    }

    /// Squared euclidean norm
    pub fn norm2(&self) -> f64 {
        self.dot(self)
    }

    /// Euclidean norm
    pub fn norm(&self) -> f64 {
        self.norm2().sqrt()
    }

    /// The vector scaled to unit length
    pub fn normalized(&self) -> Self {
        *self / self.norm()
    }

    /// Triple product `self . (b x c)`
    pub fn det(&self, b: &Self, c: &Self) -> f64 {
        self.dot(&b.cross(c))
    }
}

impl From<[f64; 3]> for Vect3 {
    fn from(coords: [f64; 3]) -> Self {
        Self(coords)
    }
}

impl Index<usize> for Vect3 {
    type Output = f64;
    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

impl Add for Vect3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self([self.0[0] + rhs.0[0], self.0[1] + rhs.0[1], self.0[2] + rhs.0[2]])
    }
}

impl AddAssign for Vect3 {
    fn add_assign(&mut self, rhs: Self) {
        for (a, b) in self.0.iter_mut().zip(rhs.0) {
            *a += b;
        }
    }
}

impl Sub for Vect3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self([self.0[0] - rhs.0[0], self.0[1] - rhs.0[1], self.0[2] - rhs.0[2]])
    }
}

impl SubAssign for Vect3 {
    fn sub_assign(&mut self, rhs: Self) {
        for (a, b) in self.0.iter_mut().zip(rhs.0) {
            *a -= b;
        }
    }
}

impl Mul<f64> for Vect3 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self([self.0[0] * rhs, self.0[1] * rhs, self.0[2] * rhs])
    }
}

impl Div<f64> for Vect3 {
    type Output = Self;
    fn div(self, rhs: f64) -> Self {
        Self([self.0[0] / rhs, self.0[1] / rhs, self.0[2] / rhs])
    }
}

impl Neg for Vect3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self([-self.0[0], -self.0[1], -self.0[2]])
    }
}

impl Zero for Vect3 {
    fn zero() -> Self {
        Self([0.0; 3])
    }
    fn is_zero(&self) -> bool {
        self.0.iter().all(|x| *x == 0.0)
    }
}
