//! Integration of sampled signals over SO(3).

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::tables;

/// Normalized integral `(1/8π²) ∫ f(g) dg` of each channel.
///
/// Input `[batch, channels, 2b, 2b, 2b]` on the SOFT grid, output
/// `[batch, channels]`. A constant signal integrates to itself. Being an
/// average over the whole group, the result is invariant to rotating the
/// input, which makes it the usual global pooling after a stack of
/// convolutions.
pub fn so3_integrate<B: Backend>(x: Tensor<B, 5>) -> Tensor<B, 2> {
    let [batch, channels, n_beta, n_alpha, n_gamma] = x.dims();
    assert!(
        n_beta == n_alpha && n_alpha == n_gamma && n_beta > 0 && n_beta % 2 == 0,
        "signal must be sampled on a (2b)³ grid, got {}×{}×{}",
        n_beta,
        n_alpha,
        n_gamma
    );

    let device = x.device();
    let weights = tables::quadrature(n_beta / 2).real_tensor::<B>(&device);

    x.sum_dim(4)
        .sum_dim(3)
        .reshape([batch * channels, n_beta])
        .matmul(weights)
        .reshape([batch, channels])
}
