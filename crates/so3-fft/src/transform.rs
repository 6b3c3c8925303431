//! Forward and inverse SO(3) Fourier transforms on the SOFT grid.
//!
//! Both directions separate into a DFT over each azimuthal axis (dense
//! matmuls against cached `exp(±imα)` tables) and a per-degree Wigner-d
//! contraction over beta. Everything is built from differentiable burn ops,
//! so autodiff backends get the adjoint transforms for free.
//!
//! ```text
//! forward:  F^l_{mn} = Σ_j w_j d^l_{mn}(β_j) Σ_{a,c} f(α_a, β_j, γ_c) e^{+i(mα_a + nγ_c)}
//! inverse:  f(α, β, γ) = Re Σ_l (2l+1) Σ_{mn} F^l_{mn} e^{-imα} d^l_{mn}(β) e^{-inγ}
//! ```

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use so3_core::ComplexTensor;

use crate::spectrum::{bandwidth_from_nspec, degree_offset, nspec};
use crate::tables;

/// Forward transform of a real signal.
///
/// Input `[batch, channels, 2b_in, 2b_in, 2b_in]` with axes ordered
/// `(beta, alpha, gamma)`; output `[nspec(b_out), batch, channels]`.
/// Degrees `l >= min(b_in, b_out)` are zero: a coarser grid carries no
/// information about them, and a finer one is truncated. An empty batch or
/// channel axis gives an empty spectrum.
///
/// # Panics
///
/// Panics if the three grid axes differ, are odd, or `b_out` is zero.
pub fn so3_rfft<B: Backend>(x: Tensor<B, 5>, b_out: usize) -> ComplexTensor<B, 3> {
    let [batch, channels, n_beta, n_alpha, n_gamma] = x.dims();
    assert!(
        n_beta == n_alpha && n_alpha == n_gamma && n_beta > 0 && n_beta % 2 == 0,
        "signal must be sampled on a (2b)³ grid, got {}×{}×{}",
        n_beta,
        n_alpha,
        n_gamma
    );
    assert!(b_out > 0, "output bandwidth must be positive");

    let device = x.device();
    let bc = batch * channels;
    if bc == 0 {
        return ComplexTensor::zeros([nspec(b_out), batch, channels], &device);
    }

    let b_in = n_beta / 2;
    let n = n_beta;
    let nl = b_in.min(b_out);
    let width = 2 * nl - 1;
    let centre = nl - 1;

    let dft = tables::forward_dft(b_in, nl).complex_tensor::<B>(&device);
    let wigner = tables::forward_wigner(b_in, nl).real_tensor::<B>(&device);

    // gamma -> n
    let x = x.reshape([bc * n * n, n]);
    let spec = ComplexTensor::new(x.clone().matmul(dft.re.clone()), x.matmul(dft.im.clone()));

    // alpha -> m
    let spec = spec
        .reshape([bc * n, n, width])
        .swap_dims(1, 2)
        .reshape([bc * n * width, n])
        .matmul(dft);

    // [bc, beta, m, n]
    let spec = spec.reshape([bc, n, width, width]).swap_dims(2, 3);

    let mut blocks = Vec::with_capacity(nl + 1);
    for l in 0..nl {
        let w = 2 * l + 1;
        let block = spec
            .clone()
            .narrow(2, centre - l, w)
            .narrow(3, centre - l, w);
        let weights = wigner
            .clone()
            .narrow(1, degree_offset(l), w * w)
            .reshape([1, n, w, w]);
        blocks.push(block.mul_real(weights).sum_dim(1).reshape([bc, w * w]));
    }
    if b_out > nl {
        blocks.push(ComplexTensor::zeros([bc, nspec(b_out) - nspec(nl)], &device));
    }

    ComplexTensor::cat(blocks, 1)
        .reshape([batch, channels, nspec(b_out)])
        .permute([2, 0, 1])
}

/// Inverse transform to a real signal.
///
/// Input `[nspec(b), batch, channels]`; output
/// `[batch, channels, 2b, 2b, 2b]` ordered `(beta, alpha, gamma)`. Only the
/// real part of the synthesis is returned.
///
/// # Panics
///
/// Panics if the spectral length is not `nspec(b)` for a positive `b`.
pub fn so3_rifft<B: Backend>(z: ComplexTensor<B, 3>) -> Tensor<B, 5> {
    let [ns, batch, channels] = z.dims();
    let b = match bandwidth_from_nspec(ns) {
        Some(b) if b > 0 => b,
        _ => panic!("spectral length {} is not b(4b²-1)/3 for any bandwidth", ns),
    };

    let device = z.device();
    let n = 2 * b;
    let bc = batch * channels;
    if bc == 0 {
        return Tensor::zeros([batch, channels, n, n, n], &device);
    }

    let width = 2 * b - 1;
    let centre = b - 1;

    let wigner = tables::inverse_wigner(b).real_tensor::<B>(&device);
    let dft = tables::inverse_dft(b).complex_tensor::<B>(&device);

    // Scatter each degree into a dense [beta, m, n, bc] block, weighted by (2l+1) d^l(β)
    let z = z.reshape([ns, bc]);
    let mut acc_re = Tensor::<B, 4>::zeros([n, width, width, bc], &device);
    let mut acc_im = Tensor::<B, 4>::zeros([n, width, width, bc], &device);
    for l in 0..b {
        let w = 2 * l + 1;
        let offset = degree_offset(l);
        let coeffs = z.clone().narrow(0, offset, w * w).reshape([1, w, w, bc]);
        let weights = wigner.clone().narrow(1, offset, w * w).reshape([n, w, w, 1]);
        let block = coeffs.mul_real(weights);
        acc_re = add_centered(acc_re, block.re, centre - l);
        acc_im = add_centered(acc_im, block.im, centre - l);
    }

    // n -> gamma
    let spec = ComplexTensor::new(acc_re, acc_im)
        .permute([3, 0, 1, 2])
        .reshape([bc * n * width, width])
        .matmul(dft.clone());

    // m -> alpha, real part only
    let spec = spec
        .reshape([bc * n, width, n])
        .swap_dims(1, 2)
        .reshape([bc * n * n, width]);
    let out = spec.re.matmul(dft.re) - spec.im.matmul(dft.im);

    // [b, c, beta, gamma, alpha] -> [b, c, beta, alpha, gamma]
    out.reshape([batch, channels, n, n, n]).swap_dims(3, 4)
}

/// Add `block` into the square window of `acc` starting at `lo` on dims 1 and 2.
fn add_centered<B: Backend>(acc: Tensor<B, 4>, block: Tensor<B, 4>, lo: usize) -> Tensor<B, 4> {
    let [n, w, _, bc] = block.dims();
    let ranges = [0..n, lo..lo + w, lo..lo + w, 0..bc];
    let current = acc.clone().slice(ranges.clone());
    acc.slice_assign(ranges, current + block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use so3_core::backend::{init_cpu_device, CpuBackend};

    #[test]
    fn test_rfft_shape() {
        let device = init_cpu_device();
        let x = Tensor::<CpuBackend, 5>::ones([2, 3, 4, 4, 4], &device);
        let z = so3_rfft(x, 2);
        assert_eq!(z.dims(), [nspec(2), 2, 3]);
    }

    #[test]
    fn test_rfft_zero_pads_when_upsampling() {
        let device = init_cpu_device();
        let x = Tensor::<CpuBackend, 5>::ones([1, 1, 2, 2, 2], &device);
        let z = so3_rfft(x, 3);
        assert_eq!(z.dims(), [nspec(3), 1, 1]);

        let re: Vec<f32> = z.re.into_data().to_vec().unwrap();
        // constant 1 has F^0 = 1 and nothing else
        assert!((re[0] - 1.0).abs() < 1e-5);
        assert!(re[1..].iter().all(|v| v.abs() < 1e-6));
    }

    #[test]
    fn test_rifft_shape() {
        let device = init_cpu_device();
        let z = ComplexTensor::<CpuBackend, 3>::zeros([nspec(3), 2, 5], &device);
        assert_eq!(so3_rifft(z).dims(), [2, 5, 6, 6, 6]);
    }

    #[test]
    fn test_empty_batch_passes_through_both_directions() {
        let device = init_cpu_device();
        let z = so3_rfft(Tensor::<CpuBackend, 5>::zeros([0, 2, 4, 4, 4], &device), 3);
        assert_eq!(z.dims(), [nspec(3), 0, 2]);

        let x = so3_rifft(z);
        assert_eq!(x.dims(), [0, 2, 6, 6, 6]);
    }

    #[test]
    #[should_panic(expected = "(2b)³ grid")]
    fn test_rfft_rejects_non_cubic_grid() {
        let device = init_cpu_device();
        so3_rfft(Tensor::<CpuBackend, 5>::zeros([1, 1, 4, 4, 2], &device), 2);
    }

    #[test]
    #[should_panic(expected = "spectral length")]
    fn test_rifft_rejects_bad_length() {
        let device = init_cpu_device();
        so3_rifft(ComplexTensor::<CpuBackend, 3>::zeros([11, 1, 1], &device));
    }
}
