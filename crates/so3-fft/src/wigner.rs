//! Wigner-d and Wigner-D functions.
//!
//! # Conventions
//!
//! ```text
//! d^l_{mn}(β)      = ⟨l m| exp(-iβ J_y) |l n⟩          (real)
//! D^l_{mn}(α,β,γ)  = exp(-imα) d^l_{mn}(β) exp(-inγ)   (ZYZ Euler angles)
//! ```
//!
//! # Evaluation
//!
//! For a fixed order pair `(m, n)`, the closed-form sum has a single term at
//! the lowest degree `l₀ = max(|m|, |n|)`, so it is exact there. Higher
//! degrees follow from the three-term recurrence
//!
//! ```text
//! d^{l+1} = a_l (cos β - mn / l(l+1)) d^l - c_l d^{l-1}
//! a_l = (l+1)(2l+1) / sqrt(((l+1)² - m²)((l+1)² - n²))
//! c_l = (l+1) sqrt((l² - m²)(l² - n²)) / (l sqrt(((l+1)² - m²)((l+1)² - n²)))
//! ```
//!
//! which stays accurate where the alternating closed-form sum loses all
//! precision (degrees beyond ~20).

use crate::spectrum::{nspec, spectral_index};

fn ln_factorial(n: i64) -> f64 {
    (2..=n).map(|k| (k as f64).ln()).sum()
}

/// Closed-form Wigner-d via the finite sum over `s`.
///
/// Exact at the lowest degree of an order pair; loses precision at high
/// degrees, where [`wigner_d`] should be used instead.
pub fn wigner_d_closed_form(l: usize, m: i64, n: i64, beta: f64) -> f64 {
    let l = l as i64;
    if m.abs() > l || n.abs() > l {
        return 0.0;
    }
    let (half_sin, half_cos) = (beta / 2.0).sin_cos();
    let prefactor = 0.5 * (ln_factorial(l + m) + ln_factorial(l - m) + ln_factorial(l + n) + ln_factorial(l - n));

    let s_min = 0.max(n - m);
    let s_max = (l + n).min(l - m);
    (s_min..=s_max)
        .map(|s| {
            let ln_mag = prefactor
                - ln_factorial(l + n - s)
                - ln_factorial(s)
                - ln_factorial(m - n + s)
                - ln_factorial(l - m - s);
            let sign = if (m - n + s).rem_euclid(2) == 0 { 1.0 } else { -1.0 };
            sign * ln_mag.exp()
                * half_cos.powi((2 * l + n - m - 2 * s) as i32)
                * half_sin.powi((m - n + 2 * s) as i32)
        })
        .sum()
}

/// `d^l_{mn}(β)` for every degree `l < nl` of one order pair.
///
/// Entries below `max(|m|, |n|)` are zero.
pub fn wigner_d_degrees(nl: usize, m: i64, n: i64, beta: f64) -> Vec<f64> {
    let mut out = vec![0.0; nl];
    let l0 = m.unsigned_abs().max(n.unsigned_abs()) as usize;
    if l0 >= nl {
        return out;
    }

    let cos_beta = beta.cos();
    let (mf, nf) = (m as f64, n as f64);

    let mut prev = 0.0;
    let mut cur = wigner_d_closed_form(l0, m, n, beta);
    out[l0] = cur;

    for l in l0..nl - 1 {
        let lf = l as f64;
        let l1 = lf + 1.0;
        let denom = ((l1 * l1 - mf * mf) * (l1 * l1 - nf * nf)).sqrt();
        let a = l1 * (2.0 * lf + 1.0) / denom;
        let next = if l == 0 {
            a * cos_beta * cur
        } else {
            let c = l1 * ((lf * lf - mf * mf) * (lf * lf - nf * nf)).sqrt() / (lf * denom);
            a * (cos_beta - mf * nf / (lf * l1)) * cur - c * prev
        };
        prev = cur;
        cur = next;
        out[l + 1] = cur;
    }
    out
}

/// `d^l_{mn}(β)`.
pub fn wigner_d(l: usize, m: i64, n: i64, beta: f64) -> f64 {
    wigner_d_degrees(l + 1, m, n, beta)[l]
}

/// The `(2l+1) × (2l+1)` matrix `d^l(β)`, row `m`, column `n`, row-major.
pub fn wigner_d_matrix(l: usize, beta: f64) -> Vec<f64> {
    let li = l as i64;
    (-li..=li)
        .flat_map(|m| (-li..=li).map(move |n| wigner_d(l, m, n, beta)))
        .collect()
}

/// The complex matrix `D^l(α, β, γ)` as `(real, imaginary)` row-major parts.
pub fn wigner_big_d(l: usize, alpha: f64, beta: f64, gamma: f64) -> (Vec<f64>, Vec<f64>) {
    let li = l as i64;
    let d = wigner_d_matrix(l, beta);
    let width = 2 * l + 1;
    let mut re = vec![0.0; width * width];
    let mut im = vec![0.0; width * width];

    for (i, m) in (-li..=li).enumerate() {
        for (j, n) in (-li..=li).enumerate() {
            let phase = -(m as f64 * alpha + n as f64 * gamma);
            let idx = i * width + j;
            re[idx] = d[idx] * phase.cos();
            im[idx] = d[idx] * phase.sin();
        }
    }
    (re, im)
}

/// `d^l_{mn}(β_j)` for every polar angle and every spectral index of
/// bandwidth `nl`, row-major `[betas.len(), nspec(nl)]`.
pub fn wigner_d_table(betas: &[f64], nl: usize) -> Vec<f64> {
    let ns = nspec(nl);
    let mut table = vec![0.0; betas.len() * ns];
    if nl == 0 {
        return table;
    }
    let lmax = (nl - 1) as i64;

    for (j, &beta) in betas.iter().enumerate() {
        let row = &mut table[j * ns..(j + 1) * ns];
        for m in -lmax..=lmax {
            for n in -lmax..=lmax {
                let l0 = m.unsigned_abs().max(n.unsigned_abs()) as usize;
                let values = wigner_d_degrees(nl, m, n, beta);
                for (l, &value) in values.iter().enumerate().skip(l0) {
                    row[spectral_index(l, m, n)] = value;
                }
            }
        }
    }
    table
}
