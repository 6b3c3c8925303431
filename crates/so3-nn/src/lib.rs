//! # so3-nn
//!
//! Rotation-equivariant layers for signals on SO(3), as burn modules.
//!
//! - [`So3Convolution`]: spectral convolution with a kernel localized on a
//!   [`So3Grid`](so3_core::So3Grid), changing channels and bandwidth
//! - [`So3Shortcut`]: residual path, identity or a one-point convolution
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use so3_core::backend::{init_cpu_device, CpuBackend};
//! use so3_core::{GridSpec, RngKey};
//! use so3_nn::So3ConvolutionConfig;
//! use burn::tensor::{Distribution, Tensor};
//!
//! let device = init_cpu_device();
//! let conv = So3ConvolutionConfig::new(3, 8, 8, 6)
//!     .with_grid(GridSpec::near_identity_default())
//!     .init_with::<CpuBackend>(RngKey::new(42), &device);
//!
//! let x = Tensor::random([4, 3, 16, 16, 16], Distribution::Normal(0.0, 1.0), &device);
//! let y = conv.forward(x); // [4, 8, 12, 12, 12]
//! ```

pub mod conv;
pub mod shortcut;

pub use conv::{kernel_std, So3Convolution, So3ConvolutionConfig};
pub use shortcut::{So3Shortcut, So3ShortcutConfig};
