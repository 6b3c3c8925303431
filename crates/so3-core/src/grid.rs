//! Point sets on SO(3) used as kernel supports.
//!
//! Rotations are ZYZ Euler triples `(alpha, beta, gamma)`. A kernel of a
//! convolution layer holds one learned weight per grid point and per channel
//! pair, so the grid fixes both the shape of the kernel and where on the group
//! the filter is localized.
//!
//! | Constructor | Support |
//! |-------------|---------|
//! | [`So3Grid::identity`] | single point at the identity rotation |
//! | [`So3Grid::near_identity`] | rings around the identity, small polar angle |
//! | [`So3Grid::equatorial`] | rotations moving the north pole to the equator |
//! | [`So3Grid::soft`] | the full `(2b)³` sampling grid |

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// A rotation in ZYZ Euler angles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EulerAngles {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl EulerAngles {
    pub const IDENTITY: EulerAngles = EulerAngles {
        alpha: 0.0,
        beta: 0.0,
        gamma: 0.0,
    };

    pub const fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self { alpha, beta, gamma }
    }
}

impl From<(f64, f64, f64)> for EulerAngles {
    fn from((alpha, beta, gamma): (f64, f64, f64)) -> Self {
        Self { alpha, beta, gamma }
    }
}

/// An ordered set of rotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct So3Grid {
    points: Vec<EulerAngles>,
}

impl So3Grid {
    pub fn new(points: Vec<EulerAngles>) -> Self {
        Self { points }
    }

    /// The single point `(0, 0, 0)`.
    pub fn identity() -> Self {
        Self {
            points: vec![EulerAngles::IDENTITY],
        }
    }

    /// Rings of points around the identity.
    ///
    /// `n_beta` polar distances in `(0, max_beta]`, `n_alpha` azimuths per
    /// ring and `n_gamma` values of the residual rotation spanning
    /// `[-max_gamma, max_gamma]`. Gamma is stored relative to alpha
    /// (`gamma = pre_gamma - alpha`) so that `pre_gamma = 0` is a pure tilt.
    pub fn near_identity(
        max_beta: f64,
        max_gamma: f64,
        n_alpha: usize,
        n_beta: usize,
        n_gamma: usize,
    ) -> Self {
        let betas: Vec<f64> = (1..=n_beta)
            .map(|i| i as f64 * max_beta / n_beta as f64)
            .collect();
        let alphas = linspace(0.0, 2.0 * PI, n_alpha, false);
        let pre_gammas = linspace(-max_gamma, max_gamma, n_gamma, true);

        let mut points = Vec::with_capacity(betas.len() * alphas.len() * pre_gammas.len());
        for &beta in &betas {
            for &alpha in &alphas {
                for &pre_gamma in &pre_gammas {
                    points.push(EulerAngles::new(alpha, beta, pre_gamma - alpha));
                }
            }
        }
        Self { points }
    }

    /// Rotations taking the north pole to a band around the equator.
    pub fn equatorial(
        max_beta: f64,
        max_gamma: f64,
        n_alpha: usize,
        n_beta: usize,
        n_gamma: usize,
    ) -> Self {
        let betas = linspace(PI / 2.0 - max_beta, PI / 2.0 + max_beta, n_beta, true);
        let alphas = linspace(0.0, 2.0 * PI, n_alpha, false);
        let gammas = linspace(-max_gamma, max_gamma, n_gamma, true);

        let mut points = Vec::with_capacity(betas.len() * alphas.len() * gammas.len());
        for &beta in &betas {
            for &alpha in &alphas {
                for &gamma in &gammas {
                    points.push(EulerAngles::new(alpha, beta, gamma));
                }
            }
        }
        Self { points }
    }

    /// The SOFT sampling grid for bandwidth `b`, ordered beta, alpha, gamma.
    pub fn soft(b: usize) -> Self {
        let n = 2 * b;
        let mut points = Vec::with_capacity(n * n * n);
        for j in 0..n {
            let beta = PI * (2 * j + 1) as f64 / (4 * b) as f64;
            for k in 0..n {
                let alpha = 2.0 * PI * k as f64 / n as f64;
                for l in 0..n {
                    let gamma = 2.0 * PI * l as f64 / n as f64;
                    points.push(EulerAngles::new(alpha, beta, gamma));
                }
            }
        }
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[EulerAngles] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &EulerAngles> {
        self.points.iter()
    }

    /// Bit-exact fingerprint of the grid, usable as a hash key.
    pub fn fingerprint(&self) -> Vec<[u64; 3]> {
        self.points
            .iter()
            .map(|p| [p.alpha.to_bits(), p.beta.to_bits(), p.gamma.to_bits()])
            .collect()
    }
}

impl From<Vec<(f64, f64, f64)>> for So3Grid {
    fn from(points: Vec<(f64, f64, f64)>) -> Self {
        Self::new(points.into_iter().map(EulerAngles::from).collect())
    }
}

/// Serializable description of a grid.
///
/// ```toml
/// [grid]
/// kind = "near_identity"
/// max_beta = 0.3927
/// max_gamma = 6.2832
/// n_alpha = 8
/// n_beta = 3
/// n_gamma = 8
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GridSpec {
    #[default]
    Identity,
    NearIdentity {
        max_beta: f64,
        max_gamma: f64,
        n_alpha: usize,
        n_beta: usize,
        n_gamma: usize,
    },
    Equatorial {
        max_beta: f64,
        max_gamma: f64,
        n_alpha: usize,
        n_beta: usize,
        n_gamma: usize,
    },
    Soft {
        b: usize,
    },
    Points {
        points: Vec<EulerAngles>,
    },
}

impl GridSpec {
    /// Near-identity grid with the usual first-layer-after-S² settings:
    /// beta up to π/8, full gamma range, 8 × 3 × 8 points.
    pub fn near_identity_default() -> Self {
        GridSpec::NearIdentity {
            max_beta: PI / 8.0,
            max_gamma: 2.0 * PI,
            n_alpha: 8,
            n_beta: 3,
            n_gamma: 8,
        }
    }

    /// Equatorial grid with a single ring of 32 azimuths and two gammas.
    pub fn equatorial_default() -> Self {
        GridSpec::Equatorial {
            max_beta: 0.0,
            max_gamma: PI / 8.0,
            n_alpha: 32,
            n_beta: 1,
            n_gamma: 2,
        }
    }

    pub fn build(&self) -> So3Grid {
        match self {
            GridSpec::Identity => So3Grid::identity(),
            GridSpec::NearIdentity {
                max_beta,
                max_gamma,
                n_alpha,
                n_beta,
                n_gamma,
            } => So3Grid::near_identity(*max_beta, *max_gamma, *n_alpha, *n_beta, *n_gamma),
            GridSpec::Equatorial {
                max_beta,
                max_gamma,
                n_alpha,
                n_beta,
                n_gamma,
            } => So3Grid::equatorial(*max_beta, *max_gamma, *n_alpha, *n_beta, *n_gamma),
            GridSpec::Soft { b } => So3Grid::soft(*b),
            GridSpec::Points { points } => So3Grid::new(points.clone()),
        }
    }
}

/// `num` evenly spaced values from `start`, inclusive of `stop` when
/// `endpoint` is set. A single requested value is `start`.
fn linspace(start: f64, stop: f64, num: usize, endpoint: bool) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let div = if endpoint { num - 1 } else { num } as f64;
            let step = (stop - start) / div;
            (0..num).map(|i| start + step * i as f64).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_grid() {
        let grid = So3Grid::identity();
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.points()[0], EulerAngles::IDENTITY);
    }

    #[test]
    fn test_near_identity_layout() {
        let grid = So3Grid::near_identity(PI / 8.0, 2.0 * PI, 8, 3, 8);
        assert_eq!(grid.len(), 8 * 3 * 8);

        // beta is outermost and never zero
        assert!((grid.points()[0].beta - PI / 24.0).abs() < 1e-12);
        assert!((grid.points()[grid.len() - 1].beta - PI / 8.0).abs() < 1e-12);

        // gamma = pre_gamma - alpha, first point has alpha = 0, pre_gamma = -2π
        assert!((grid.points()[0].gamma + 2.0 * PI).abs() < 1e-12);
        let second_alpha = grid.points()[8];
        assert!((second_alpha.alpha - PI / 4.0).abs() < 1e-12);
        assert!((second_alpha.gamma - (-2.0 * PI - PI / 4.0)).abs() < 1e-12);
    }

    #[test]
    fn test_equatorial_single_ring() {
        let grid = So3Grid::equatorial(0.0, PI / 8.0, 32, 1, 2);
        assert_eq!(grid.len(), 64);
        assert!(grid.iter().all(|p| (p.beta - PI / 2.0).abs() < 1e-12));
        assert!((grid.points()[0].gamma + PI / 8.0).abs() < 1e-12);
        assert!((grid.points()[1].gamma - PI / 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_soft_grid_matches_sampling() {
        let grid = So3Grid::soft(2);
        assert_eq!(grid.len(), 64);
        assert!((grid.points()[0].beta - PI / 8.0).abs() < 1e-12);
        assert!((grid.points()[1].gamma - PI / 2.0).abs() < 1e-12);
        assert!((grid.points()[4].alpha - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_grid_spec_toml_roundtrip() {
        let spec = GridSpec::near_identity_default();
        let text = toml::to_string(&spec).expect("serialize");
        assert!(text.contains("kind = \"near_identity\""));
        let back: GridSpec = toml::from_str(&text).expect("deserialize");
        assert_eq!(back, spec);
        assert_eq!(back.build().len(), 192);
    }

    #[test]
    fn test_fingerprint_distinguishes_grids() {
        assert_ne!(
            So3Grid::identity().fingerprint(),
            So3Grid::soft(1).fingerprint()
        );
    }
}
