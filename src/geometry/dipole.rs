//! Current dipoles
use crate::geometry::Vect3;

/// A current dipole
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dipole {
    position: Vect3,
    moment: Vect3,
}

impl Dipole {
    /// Create a dipole
    pub fn new(position: Vect3, moment: Vect3) -> Self {
        Self { position, moment }
    }
    /// Location of the dipole
    pub fn position(&self) -> &Vect3 {
        &self.position
    }
    /// Moment of the dipole
    pub fn moment(&self) -> &Vect3 {
        &self.moment
    }

    /// Unscaled potential `q.(r - p) / |r - p|^3` created at `r` in an infinite medium
    pub fn potential(&self, r: &Vect3) -> f64 {
        let x = *r - self.position;
        let n = x.norm();
        self.moment.dot(&x) / (n * n * n)
    }

    /// Gradient of [Dipole::potential] at `r`
    pub fn potential_gradient(&self, r: &Vect3) -> Vect3 {
        let x = *r - self.position;
        let n2 = x.norm2();
        let n3 = n2 * n2.sqrt();
        self.moment / n3 - x * (3.0 * self.moment.dot(&x) / (n3 * n2))
    }
}
