//! Fourier transform of kernels supported on a finite set of rotations.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use so3_core::{ComplexTensor, So3Grid};

use crate::spectrum::nspec;
use crate::tables;

/// Spectrum of a kernel with one weight per grid point.
///
/// `kernel` is `[in, out, grid.len()]`; the result is `[in, out, nspec(b)]`
/// with `Ψ^l_{mn} = 2b Σ_g k_g conj(D^l_{mn}(g))`. The `2b` factor is the
/// number of samples along one azimuthal axis, so that convolving with a
/// kernel at the identity multiplies the band-limited input by `2b`.
///
/// # Panics
///
/// Panics if the last kernel axis differs from the grid size.
pub fn so3_local_ft<B: Backend>(
    kernel: Tensor<B, 3>,
    b: usize,
    grid: &So3Grid,
) -> ComplexTensor<B, 3> {
    let [n_in, n_out, n_grid] = kernel.dims();
    assert_eq!(
        n_grid,
        grid.len(),
        "kernel has {} grid weights but the grid has {} points",
        n_grid,
        grid.len()
    );

    let device = kernel.device();
    let table = tables::local_ft(b, grid).complex_tensor::<B>(&device);
    let kernel = kernel.reshape([n_in * n_out, n_grid]);

    ComplexTensor::new(kernel.clone().matmul(table.re), kernel.matmul(table.im))
        .reshape([n_in, n_out, nspec(b)])
}
