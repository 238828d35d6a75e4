//! Numerical quadrature
mod integrator;
pub mod simplex_rules;
pub mod types;

pub use integrator::{Integrator, RULE_SIZES};
