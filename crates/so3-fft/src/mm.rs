//! Block-diagonal spectral product, the convolution theorem on SO(3).

use burn::tensor::backend::Backend;
use so3_core::ComplexTensor;

use crate::spectrum::{bandwidth_from_nspec, degree_offset};

/// Multiply input and kernel spectra degree by degree.
///
/// `x` is `[nspec, batch, in]` and `y` is `[nspec, in, out]`; the result is
/// `[nspec, batch, out]` with
///
/// ```text
/// z^l[b, o, m, m'] = Σ_{i, n} x^l[b, i, m, n] · conj(y^l[i, o, m', n])
/// ```
///
/// # Panics
///
/// Panics if the spectral lengths differ, are not a valid `nspec(b)`, or the
/// input channel counts disagree.
pub fn so3_mm<B: Backend>(x: ComplexTensor<B, 3>, y: ComplexTensor<B, 3>) -> ComplexTensor<B, 3> {
    let [ns, batch, n_in] = x.dims();
    let [ns_y, n_in_y, n_out] = y.dims();
    assert_eq!(ns, ns_y, "spectral lengths differ: {} vs {}", ns, ns_y);
    assert_eq!(n_in, n_in_y, "input channels differ: {} vs {}", n_in, n_in_y);
    let b = bandwidth_from_nspec(ns)
        .unwrap_or_else(|| panic!("spectral length {} is not b(4b²-1)/3 for any bandwidth", ns));
    if batch * n_in * n_out == 0 {
        return ComplexTensor::zeros([ns, batch, n_out], &x.device());
    }

    let mut blocks = Vec::with_capacity(b);
    for l in 0..b {
        let w = 2 * l + 1;
        let offset = degree_offset(l);

        // rows (b, m), cols (n, i)
        let xl = x
            .clone()
            .narrow(0, offset, w * w)
            .reshape([w, w, batch, n_in])
            .permute([2, 0, 1, 3])
            .reshape([batch * w, w * n_in]);
        // rows (n, i), cols (m', o)
        let yl = y
            .clone()
            .narrow(0, offset, w * w)
            .reshape([w, w, n_in, n_out])
            .permute([1, 2, 0, 3])
            .reshape([w * n_in, w * n_out]);

        let zl = xl
            .matmul_conj(yl)
            .reshape([batch, w, w, n_out])
            .permute([1, 2, 0, 3])
            .reshape([w * w, batch, n_out]);
        blocks.push(zl);
    }

    ComplexTensor::cat(blocks, 0)
}
