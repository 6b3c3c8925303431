#![allow(clippy::needless_range_loop)]

//! # so3-fft
//!
//! Fourier analysis on the rotation group for burn tensors.
//!
//! Signals on SO(3) are sampled on the SOFT grid of bandwidth `b`, a
//! `(2b)³` array ordered `(beta, alpha, gamma)`. Their spectra are complex
//! tensors whose first axis runs over every `(l, m, n)` with `l < b`, see
//! [`spectrum`].
//!
//! ## Operations
//!
//! | Function | Input | Output |
//! |----------|-------|--------|
//! | [`so3_rfft`] | `[B, C, 2b, 2b, 2b]` real | `[nspec(b_out), B, C]` complex |
//! | [`so3_rifft`] | `[nspec(b), B, C]` complex | `[B, C, 2b, 2b, 2b]` real |
//! | [`so3_local_ft`] | `[in, out, G]` kernel + grid | `[in, out, nspec(b)]` complex |
//! | [`so3_mm`] | `[nspec, B, in]`, `[nspec, in, out]` | `[nspec, B, out]` |
//! | [`so3_integrate`] | `[B, C, 2b, 2b, 2b]` | `[B, C]` |
//!
//! All five are compositions of ordinary burn ops and are differentiable
//! under any autodiff backend.
//!
//! ## Tables
//!
//! Wigner-d, DFT and local transform matrices are built once in f64 and
//! held in a process-wide LRU [`cache`]. Resize it with
//! [`cache::set_capacity`] to trade memory for rebuilds when many
//! bandwidths are in play.
//!
//! ```rust,ignore
//! use so3_core::backend::{init_cpu_device, CpuBackend};
//! use so3_fft::{so3_rfft, so3_rifft};
//! use burn::tensor::{Distribution, Tensor};
//!
//! let device = init_cpu_device();
//! let x: Tensor<CpuBackend, 5> = Tensor::random([1, 1, 8, 8, 8], Distribution::Default, &device);
//! let spectrum = so3_rfft(x, 4);
//! let band_limited = so3_rifft(spectrum);
//! ```

pub mod cache;
pub mod integrate;
pub mod local_ft;
pub mod mm;
pub mod quadrature;
pub mod spectrum;
pub mod tables;
pub mod transform;
pub mod wigner;

pub use integrate::so3_integrate;
pub use local_ft::so3_local_ft;
pub use mm::so3_mm;
pub use spectrum::{bandwidth_from_nspec, nspec, spectral_index};
pub use transform::{so3_rfft, so3_rifft};
