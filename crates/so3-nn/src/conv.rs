//! Rotation-equivariant convolution of signals on SO(3).
//!
//! The layer filters in the spectral domain:
//!
//! ```text
//! x [B, Cin, 2b_in, 2b_in, 2b_in]
//!   │ so3_rfft (degrees l < b_out)
//!   ▼
//! X [nspec, B, Cin] ──┐
//!                     │ so3_mm  ◄── Ψ [nspec, Cin, Cout] = so3_local_ft(kernel, grid)
//!                     ▼
//!              Z [nspec, B, Cout]
//!   │ so3_rifft
//!   ▼
//! y [B, Cout, 2b_out, 2b_out, 2b_out] + bias
//! ```
//!
//! Because the kernel is a function on a fixed set of rotations and the
//! product is taken degree by degree, rotating the input rotates the output.

use anyhow::Result;
use burn::module::{Ignored, Module, Param};
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use serde::{Deserialize, Serialize};
use so3_core::{GridSpec, RngKey, So3Grid};
use so3_fft::{so3_local_ft, so3_mm, so3_rfft, so3_rifft};

/// Construction parameters of a [`So3Convolution`].
///
/// ```toml
/// nfeature_in = 8
/// nfeature_out = 16
/// b_in = 8
/// b_out = 6
///
/// [grid]
/// kind = "near_identity"
/// max_beta = 0.3927
/// max_gamma = 6.2832
/// n_alpha = 8
/// n_beta = 3
/// n_gamma = 8
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct So3ConvolutionConfig {
    /// Input channels.
    pub nfeature_in: usize,
    /// Output channels.
    pub nfeature_out: usize,
    /// Bandwidth of the input grid.
    pub b_in: usize,
    /// Bandwidth of the output grid.
    pub b_out: usize,
    /// Kernel support.
    #[serde(default)]
    pub grid: GridSpec,
}

impl So3ConvolutionConfig {
    /// Config with the single-point identity grid.
    pub fn new(nfeature_in: usize, nfeature_out: usize, b_in: usize, b_out: usize) -> Self {
        Self {
            nfeature_in,
            nfeature_out,
            b_in,
            b_out,
            grid: GridSpec::Identity,
        }
    }

    pub fn with_grid(mut self, grid: GridSpec) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_bandwidths(mut self, b_in: usize, b_out: usize) -> Self {
        self.b_in = b_in;
        self.b_out = b_out;
        self
    }

    pub fn with_features(mut self, nfeature_in: usize, nfeature_out: usize) -> Self {
        self.nfeature_in = nfeature_in;
        self.nfeature_out = nfeature_out;
        self
    }

    /// Build the layer with a freshly seeded kernel.
    pub fn init<B: Backend>(&self, device: &B::Device) -> So3Convolution<B> {
        self.init_with(RngKey::from_entropy(), device)
    }

    /// Build the layer with a kernel drawn from `key`.
    ///
    /// The same key and config give bit-identical parameters.
    pub fn init_with<B: Backend>(&self, key: RngKey, device: &B::Device) -> So3Convolution<B> {
        let grid = self.grid.build();
        let kernel = sample_kernel(
            key,
            [self.nfeature_in, self.nfeature_out, grid.len()],
            kernel_std(grid.len(), self.nfeature_in, self.b_in, self.b_out),
            device,
        );
        let bias = Tensor::zeros([1, self.nfeature_out, 1, 1, 1], device);

        log::debug!(
            "Initialized SO(3) convolution: {} -> {} features, b {} -> {}, {} grid points",
            self.nfeature_in,
            self.nfeature_out,
            self.b_in,
            self.b_out,
            grid.len()
        );

        So3Convolution {
            kernel: Param::from_tensor(kernel),
            bias: Param::from_tensor(bias),
            nfeature_in: self.nfeature_in,
            nfeature_out: self.nfeature_out,
            b_in: self.b_in,
            b_out: self.b_out,
            grid: Ignored(grid),
        }
    }
}

/// Standard deviation of the initial kernel.
///
/// `1 / sqrt(|grid| · nfeature_in · (b_out / b_in)³)` keeps the output
/// variance close to the input variance.
pub fn kernel_std(grid_len: usize, nfeature_in: usize, b_in: usize, b_out: usize) -> f64 {
    let ratio = b_out as f64 / b_in as f64;
    1.0 / (grid_len as f64 * nfeature_in as f64 * ratio.powi(3)).sqrt()
}

fn sample_kernel<B: Backend>(
    key: RngKey,
    shape: [usize; 3],
    std: f64,
    device: &B::Device,
) -> Tensor<B, 3> {
    let values = key.normal(shape.iter().product(), 0.0, std);
    Tensor::from_data(TensorData::new(values, shape), device)
}

/// SO(3) → SO(3) convolution layer.
#[derive(Module, Debug)]
pub struct So3Convolution<B: Backend> {
    /// `[nfeature_in, nfeature_out, |grid|]`
    kernel: Param<Tensor<B, 3>>,
    /// `[1, nfeature_out, 1, 1, 1]`
    bias: Param<Tensor<B, 5>>,
    nfeature_in: usize,
    nfeature_out: usize,
    b_in: usize,
    b_out: usize,
    grid: Ignored<So3Grid>,
}

impl<B: Backend> So3Convolution<B> {
    pub fn nfeature_in(&self) -> usize {
        self.nfeature_in
    }

    pub fn nfeature_out(&self) -> usize {
        self.nfeature_out
    }

    pub fn b_in(&self) -> usize {
        self.b_in
    }

    pub fn b_out(&self) -> usize {
        self.b_out
    }

    pub fn grid(&self) -> &So3Grid {
        &self.grid
    }

    /// Standard deviation the kernel was initialized with.
    pub fn kernel_std(&self) -> f64 {
        kernel_std(self.grid.len(), self.nfeature_in, self.b_in, self.b_out)
    }

    pub fn kernel(&self) -> Tensor<B, 3> {
        self.kernel.val()
    }

    pub fn bias(&self) -> Tensor<B, 5> {
        self.bias.val()
    }

    /// Replace the kernel, `[nfeature_in, nfeature_out, |grid|]`.
    pub fn with_kernel(mut self, kernel: Tensor<B, 3>) -> Self {
        assert_eq!(
            kernel.dims(),
            [self.nfeature_in, self.nfeature_out, self.grid.len()],
            "kernel shape mismatch"
        );
        self.kernel = Param::from_tensor(kernel);
        self
    }

    /// Replace the bias, `[1, nfeature_out, 1, 1, 1]`.
    pub fn with_bias(mut self, bias: Tensor<B, 5>) -> Self {
        assert_eq!(
            bias.dims(),
            [1, self.nfeature_out, 1, 1, 1],
            "bias shape mismatch"
        );
        self.bias = Param::from_tensor(bias);
        self
    }

    /// Re-draw the kernel from `key` and zero the bias.
    pub fn reset_parameters(mut self, key: RngKey) -> Self {
        let device = self.kernel.device();
        let shape = [self.nfeature_in, self.nfeature_out, self.grid.len()];
        let kernel = sample_kernel(key, shape, self.kernel_std(), &device);
        self.kernel = Param::from_tensor(kernel);
        self.bias = Param::from_tensor(Tensor::zeros([1, self.nfeature_out, 1, 1, 1], &device));
        self
    }

    /// Check that `dims` is `[batch, nfeature_in, 2b_in, 2b_in, 2b_in]`.
    pub fn check_input(&self, dims: [usize; 5]) -> Result<(), String> {
        let n = 2 * self.b_in;
        let [_, channels, n_beta, n_alpha, n_gamma] = dims;
        if channels != self.nfeature_in || n_beta != n || n_alpha != n || n_gamma != n {
            return Err(format!(
                "shape mismatch: expected [_, {}, {}, {}, {}], got {:?}",
                self.nfeature_in, n, n, n, dims
            ));
        }
        Ok(())
    }

    /// Convolve `x` `[batch, nfeature_in, 2b_in, 2b_in, 2b_in]` into
    /// `[batch, nfeature_out, 2b_out, 2b_out, 2b_out]`.
    ///
    /// # Panics
    ///
    /// Panics with a shape-mismatch message if `x` has the wrong channel
    /// count or grid size.
    pub fn forward(&self, x: Tensor<B, 5>) -> Tensor<B, 5> {
        if let Err(msg) = self.check_input(x.dims()) {
            panic!("{}", msg);
        }
        self.convolve(x)
    }

    /// [`forward`](Self::forward) that reports shape errors instead of panicking.
    pub fn try_forward(&self, x: Tensor<B, 5>) -> Result<Tensor<B, 5>> {
        self.check_input(x.dims()).map_err(anyhow::Error::msg)?;
        Ok(self.convolve(x))
    }

    fn convolve(&self, x: Tensor<B, 5>) -> Tensor<B, 5> {
        log::trace!(
            "so3 conv forward: input {:?}, b {} -> {}",
            x.dims(),
            self.b_in,
            self.b_out
        );

        let spectrum = so3_rfft(x, self.b_out);
        let kernel = so3_local_ft(self.kernel.val(), self.b_out, &self.grid).permute([2, 0, 1]);
        let out = so3_rifft(so3_mm(spectrum, kernel));

        out + self.bias.val()
    }
}
