//! Get rules on the reference triangle.
//!
//! Points are given in the coordinates of the reference triangle with vertices (0, 0), (1, 0)
//! and (0, 1); weights sum to its area.

use crate::quadrature::types::{NumericalQuadratureDefinition, QuadratureError};
use std::collections::HashMap;

type RuleDefinition = (usize, Vec<f64>, Vec<f64>);

/// Expand symmetric orbits of barycentric coordinates into a rule
///
/// Each orbit is `(a, b, c, w)`: all distinct permutations of `(a, b, c)` get the weight `w`,
/// with weights normalised to sum to one over the triangle.
fn expand_orbits(order: usize, orbits: &[(f64, f64, f64, f64)]) -> RuleDefinition {
    let mut points = vec![];
    let mut weights = vec![];
    for (a, b, c, w) in orbits {
        let mut perms: Vec<[f64; 3]> = vec![];
        for p in [
            [*a, *b, *c],
            [*b, *c, *a],
            [*c, *a, *b],
            [*a, *c, *b],
            [*c, *b, *a],
            [*b, *a, *c],
        ] {
            if !perms.contains(&p) {
                perms.push(p);
            }
        }
        for p in perms {
            points.push(p[1]);
            points.push(p[2]);
            weights.push(0.5 * w);
        }
    }
    (order, points, weights)
}

lazy_static! {
    /// Symmetric Gauss rules on the triangle, indexed by number of points
    static ref TRIANGLE_RULE_DEFINITIONS: HashMap<usize, RuleDefinition> = {
        let third = 1.0 / 3.0;
        HashMap::from([
            (1, expand_orbits(1, &[(third, third, third, 1.0)])),
            (
                3,
                expand_orbits(2, &[(2.0 / 3.0, 1.0 / 6.0, 1.0 / 6.0, third)]),
            ),
            (
                6,
                expand_orbits(
                    4,
                    &[
                        (0.816847572980459, 0.091576213509771, 0.091576213509771, 0.109951743655322),
                        (0.108103018168070, 0.445948490915965, 0.445948490915965, 0.223381589678011),
                    ],
                ),
            ),
            (
                7,
                expand_orbits(
                    5,
                    &[
                        (third, third, third, 0.225),
                        (0.059715871789770, 0.470142064105115, 0.470142064105115, 0.132394152788506),
                        (0.797426985353087, 0.101286507323456, 0.101286507323456, 0.125939180544827),
                    ],
                ),
            ),
            (
                12,
                expand_orbits(
                    6,
                    &[
                        (0.501426509658179, 0.249286745170910, 0.249286745170910, 0.116786275726379),
                        (0.873821971016996, 0.063089014491502, 0.063089014491502, 0.050844906370207),
                        (0.053145049844817, 0.310352451033784, 0.636502499121399, 0.082851075618374),
                    ],
                ),
            ),
            (
                16,
                expand_orbits(
                    8,
                    &[
                        (third, third, third, 0.144315607677787),
                        (0.081414823414554, 0.459292588292723, 0.459292588292723, 0.095091634267285),
                        (0.658861384496480, 0.170569307751760, 0.170569307751760, 0.103217370534718),
                        (0.898905543365938, 0.050547228317031, 0.050547228317031, 0.032458497623198),
                        (0.008394777409958, 0.263112829634638, 0.728492392955404, 0.027230314174435),
                    ],
                ),
            ),
        ])
    };
}

/// Return a triangle rule for a given number of points.
pub fn triangle_rule(npoints: usize) -> Result<NumericalQuadratureDefinition, QuadratureError> {
    if let Some((order, points, weights)) = TRIANGLE_RULE_DEFINITIONS.get(&npoints) {
        Ok(NumericalQuadratureDefinition {
            dim: 2,
            order: *order,
            npoints,
            weights: weights.to_vec(),
            points: points.to_vec(),
        })
    } else {
        Err(QuadratureError::RuleNotFound(npoints))
    }
}

/// Return a vector with the numbers of points for which triangle rules are available.
pub fn available_rules() -> Vec<usize> {
    let mut rules = TRIANGLE_RULE_DEFINITIONS.keys().copied().collect::<Vec<_>>();
    rules.sort_unstable();
    rules
}

#[cfg(test)]
mod test {

    use super::*;
    use approx::*;
    use paste::paste;

    #[test]
    fn test_volume() {
        for npoints in available_rules() {
            let rule = triangle_rule(npoints).unwrap();
            assert_eq!(rule.weights.len(), npoints);
            assert_eq!(rule.points.len(), 2 * npoints);
            let volume_actual: f64 = rule.weights.iter().sum();
            assert_relative_eq!(volume_actual, 0.5, max_relative = 1E-13);
        }
    }

    #[test]
    fn test_missing_rule() {
        assert_eq!(
            triangle_rule(5).err(),
            Some(QuadratureError::RuleNotFound(5))
        );
    }

    // The integral of x^a y^b over the reference triangle is a! b! / (a + b + 2)!
    fn monomial_integral(a: u32, b: u32) -> f64 {
        let fact = |n: u32| (1..=n).map(f64::from).product::<f64>();
        fact(a) * fact(b) / fact(a + b + 2)
    }

    macro_rules! test_exactness {
        ($($npoints:literal),+) => {
        $(
            paste! {
                #[test]
                fn [<test_exactness_ $npoints>]() {
                    let rule = triangle_rule($npoints).unwrap();
                    for a in 0..=rule.order as u32 {
                        for b in 0..=(rule.order as u32 - a) {
                            let actual: f64 = rule
                                .weights
                                .iter()
                                .enumerate()
                                .map(|(i, w)| {
                                    w * rule.points[2 * i].powi(a as i32)
                                        * rule.points[2 * i + 1].powi(b as i32)
                                })
                                .sum();
                            assert_relative_eq!(
                                actual,
                                monomial_integral(a, b),
                                max_relative = 1E-10
                            );
                        }
                    }
                }
            }
        )*
        };
    }

    test_exactness!(1, 3, 6, 7, 12, 16);
}
