//! # so3-core
//!
//! Core types shared by the SO(3) convolution workspace.
//!
//! - [`backend`]: CPU (`NdArray`) and GPU (`Wgpu`, `gpu` feature) backend aliases
//! - [`complex`]: [`ComplexTensor`], complex arithmetic as pairs of real tensors
//! - [`grid`]: [`So3Grid`] kernel supports and their serializable [`GridSpec`]
//! - [`rng`]: [`RngKey`] for reproducible initialization
//! - [`config`]: [`RuntimeConfig`] resolved from CLI, environment and TOML
//!
//! ```rust,ignore
//! use so3_core::backend::{init_cpu_device, CpuBackend};
//! use so3_core::{GridSpec, RngKey};
//!
//! let device = init_cpu_device();
//! let grid = GridSpec::near_identity_default().build();
//! let weights = RngKey::new(42).normal(grid.len(), 0.0, 1.0);
//! ```

pub mod backend;
pub mod complex;
pub mod config;
pub mod grid;
pub mod rng;

pub use backend::*;
pub use complex::ComplexTensor;
pub use config::{DeviceKind, RuntimeArgs, RuntimeConfig, RuntimeConfigBuilder};
pub use grid::{EulerAngles, GridSpec, So3Grid};
pub use rng::RngKey;
