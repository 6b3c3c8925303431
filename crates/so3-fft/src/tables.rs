//! Builders for the precomputed matrices used by the transforms.
//!
//! Every table is computed once in f64, stored in the [`cache`](crate::cache),
//! and uploaded as f32 tensors on each use.

use std::sync::Arc;

use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use so3_core::{ComplexTensor, So3Grid};

use crate::cache::{get_or_build, Table, TableKey};
use crate::quadrature::{quadrature_weights, soft_azimuths, soft_betas};
use crate::spectrum::{degree_offset, nspec};
use crate::wigner::{wigner_big_d, wigner_d_table};

impl Table {
    /// Upload the real part as a `[rows, cols]` tensor.
    pub fn real_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2> {
        upload(&self.re, self.shape(), device)
    }

    /// Upload both parts; a real table gets a zero imaginary part.
    pub fn complex_tensor<B: Backend>(&self, device: &B::Device) -> ComplexTensor<B, 2> {
        let re = upload(&self.re, self.shape(), device);
        match &self.im {
            Some(im) => ComplexTensor::new(re, upload(im, self.shape(), device)),
            None => ComplexTensor::from_real(re),
        }
    }
}

fn upload<B: Backend>(values: &[f64], shape: [usize; 2], device: &B::Device) -> Tensor<B, 2> {
    let data: Vec<f32> = values.iter().map(|&v| v as f32).collect();
    Tensor::from_data(TensorData::new(data, shape), device)
}

/// `[2b_in, nspec(nl)]`: `w_j d^l_{mn}(β_j)` for degrees `l < nl`.
pub fn forward_wigner(b_in: usize, nl: usize) -> Arc<Table> {
    get_or_build(TableKey::ForwardWigner { b_in, nl }, || {
        let betas = soft_betas(b_in);
        let weights = quadrature_weights(b_in);
        let ns = nspec(nl);
        let mut values = wigner_d_table(&betas, nl);
        for (row, w) in values.chunks_mut(ns.max(1)).zip(&weights) {
            row.iter_mut().for_each(|v| *v *= w);
        }
        Table::real(betas.len(), ns, values)
    })
}

/// `[2b, nspec(b)]`: `(2l+1) d^l_{mn}(β_j)`.
pub fn inverse_wigner(b: usize) -> Arc<Table> {
    get_or_build(TableKey::InverseWigner { b }, || {
        let betas = soft_betas(b);
        let ns = nspec(b);
        let mut values = wigner_d_table(&betas, b);
        for row in values.chunks_mut(ns.max(1)) {
            for l in 0..b {
                let width = 2 * l + 1;
                let start = degree_offset(l);
                row[start..start + width * width]
                    .iter_mut()
                    .for_each(|v| *v *= width as f64);
            }
        }
        Table::real(betas.len(), ns, values)
    })
}

/// `[2b, 2nl-1]`: `exp(+i m α_j)`, column `k` holds order `m = k - (nl-1)`.
pub fn forward_dft(b: usize, nl: usize) -> Arc<Table> {
    get_or_build(TableKey::ForwardDft { b, nl }, || {
        let angles = soft_azimuths(b);
        let width = 2 * nl - 1;
        let centre = nl as i64 - 1;
        let mut re = Vec::with_capacity(angles.len() * width);
        let mut im = Vec::with_capacity(angles.len() * width);
        for &alpha in &angles {
            for k in 0..width as i64 {
                let (s, c) = ((k - centre) as f64 * alpha).sin_cos();
                re.push(c);
                im.push(s);
            }
        }
        Table::complex(angles.len(), width, re, im)
    })
}

/// `[2b-1, 2b]`: `exp(-i m α_j)`, row `k` holds order `m = k - (b-1)`.
pub fn inverse_dft(b: usize) -> Arc<Table> {
    get_or_build(TableKey::InverseDft { b }, || {
        let angles = soft_azimuths(b);
        let width = 2 * b - 1;
        let centre = b as i64 - 1;
        let mut re = Vec::with_capacity(width * angles.len());
        let mut im = Vec::with_capacity(width * angles.len());
        for k in 0..width as i64 {
            for &alpha in &angles {
                let (s, c) = (-(k - centre) as f64 * alpha).sin_cos();
                re.push(c);
                im.push(s);
            }
        }
        Table::complex(width, angles.len(), re, im)
    })
}

/// `[grid.len(), nspec(b)]`: `2b · conj(D^l_{mn}(g))` for each grid point.
pub fn local_ft(b: usize, grid: &So3Grid) -> Arc<Table> {
    let key = TableKey::LocalFt {
        b,
        grid: grid.fingerprint(),
    };
    get_or_build(key, || {
        let ns = nspec(b);
        let scale = (2 * b) as f64;
        let mut re = vec![0.0; grid.len() * ns];
        let mut im = vec![0.0; grid.len() * ns];
        for (g, point) in grid.iter().enumerate() {
            let row = g * ns;
            for l in 0..b {
                let (d_re, d_im) = wigner_big_d(l, point.alpha, point.beta, point.gamma);
                let start = row + degree_offset(l);
                for (i, (vr, vi)) in d_re.iter().zip(&d_im).enumerate() {
                    re[start + i] = scale * vr;
                    im[start + i] = -scale * vi;
                }
            }
        }
        Table::complex(grid.len(), ns, re, im)
    })
}

/// `[2b, 1]`: normalized quadrature weights, see [`quadrature_weights`].
pub fn quadrature(b: usize) -> Arc<Table> {
    get_or_build(TableKey::Quadrature { b }, || {
        Table::real(2 * b, 1, quadrature_weights(b))
    })
}
