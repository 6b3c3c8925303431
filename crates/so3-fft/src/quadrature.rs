//! SOFT sampling angles and quadrature weights.
//!
//! A bandwidth-`b` signal is sampled on `2b` polar angles and `2b × 2b`
//! azimuthal angles:
//!
//! ```text
//! beta_j  = π(2j + 1) / 4b        j = 0..2b
//! alpha_k = gamma_k = 2πk / 2b    k = 0..2b
//! ```
//!
//! The polar weights integrate `g(β) sin β` exactly for the products of
//! Wigner-d functions of degree `< b`.

use std::f64::consts::PI;

/// Polar sample angles for bandwidth `b`.
pub fn soft_betas(b: usize) -> Vec<f64> {
    (0..2 * b)
        .map(|j| PI * (2 * j + 1) as f64 / (4 * b) as f64)
        .collect()
}

/// Azimuthal sample angles (alpha and gamma share them) for bandwidth `b`.
pub fn soft_azimuths(b: usize) -> Vec<f64> {
    let n = 2 * b;
    (0..n).map(|k| 2.0 * PI * k as f64 / n as f64).collect()
}

/// Driscoll–Healy polar weights, summing to 2 (`∫₀^π sin β dβ`).
pub fn polar_weights(b: usize) -> Vec<f64> {
    soft_betas(b)
        .into_iter()
        .map(|beta| {
            let series: f64 = (0..b)
                .map(|k| {
                    let odd = (2 * k + 1) as f64;
                    (odd * beta).sin() / odd
                })
                .sum();
            (2.0 / b as f64) * beta.sin() * series
        })
        .collect()
}

/// Polar weights scaled for the SO(3) transform.
///
/// Divided by `2 (2b)²`, so that a weighted sum over beta combined with an
/// unnormalized DFT over alpha and gamma yields `(1/8π²) ∫ f · conj(D)`.
pub fn quadrature_weights(b: usize) -> Vec<f64> {
    let norm = 2.0 * ((2 * b) as f64).powi(2);
    polar_weights(b).into_iter().map(|w| w / norm).collect()
}
