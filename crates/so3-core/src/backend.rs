//! Backend aliases and device helpers.
//!
//! The CPU backend (`NdArray`) is always available and is what the tests run
//! on. The WGPU backend is gated behind the `gpu` feature.

use burn::backend::ndarray::NdArrayDevice;
use burn::backend::{Autodiff, NdArray};

pub type CpuBackend = NdArray<f32>;

/// CPU backend with gradient tracking, for training loops and gradient tests.
pub type CpuAutodiffBackend = Autodiff<CpuBackend>;

pub fn init_cpu_device() -> NdArrayDevice {
    NdArrayDevice::Cpu
}

#[cfg(feature = "gpu")]
pub type WgpuBackend = burn::backend::Wgpu;

#[cfg(feature = "gpu")]
pub type WgpuAutodiffBackend = Autodiff<WgpuBackend>;

#[cfg(feature = "gpu")]
pub fn init_gpu_device() -> burn::backend::wgpu::WgpuDevice {
    // Burn's WGPU backend picks the platform default adapter
    burn::backend::wgpu::WgpuDevice::default()
}
