//! Complex tensors as (real, imaginary) pairs of real burn tensors.
//!
//! Burn has no complex dtype, so spectral coefficients are carried as two
//! real tensors of identical shape. Every operation here is a composition of
//! differentiable real ops, so gradients flow through complex arithmetic
//! without custom backward passes.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// A complex tensor stored as separate real and imaginary parts.
#[derive(Debug, Clone)]
pub struct ComplexTensor<B: Backend, const D: usize> {
    pub re: Tensor<B, D>,
    pub im: Tensor<B, D>,
}

impl<B: Backend, const D: usize> ComplexTensor<B, D> {
    pub fn new(re: Tensor<B, D>, im: Tensor<B, D>) -> Self {
        assert_eq!(
            re.dims(),
            im.dims(),
            "real and imaginary parts must have the same shape"
        );
        Self { re, im }
    }

    /// Lift a real tensor; the imaginary part is zero.
    pub fn from_real(re: Tensor<B, D>) -> Self {
        let im = re.zeros_like();
        Self { re, im }
    }

    pub fn zeros(shape: [usize; D], device: &B::Device) -> Self {
        Self {
            re: Tensor::zeros(shape, device),
            im: Tensor::zeros(shape, device),
        }
    }

    pub fn dims(&self) -> [usize; D] {
        self.re.dims()
    }

    pub fn device(&self) -> B::Device {
        self.re.device()
    }

    pub fn reshape<const D2: usize>(self, shape: [usize; D2]) -> ComplexTensor<B, D2> {
        ComplexTensor {
            re: self.re.reshape(shape),
            im: self.im.reshape(shape),
        }
    }

    pub fn permute(self, axes: [isize; D]) -> Self {
        Self {
            re: self.re.permute(axes),
            im: self.im.permute(axes),
        }
    }

    pub fn swap_dims(self, dim1: usize, dim2: usize) -> Self {
        Self {
            re: self.re.swap_dims(dim1, dim2),
            im: self.im.swap_dims(dim1, dim2),
        }
    }

    /// Take `length` entries of `dim` starting at `start`.
    pub fn narrow(self, dim: usize, start: usize, length: usize) -> Self {
        Self {
            re: self.re.narrow(dim, start, length),
            im: self.im.narrow(dim, start, length),
        }
    }

    pub fn cat(tensors: Vec<Self>, dim: usize) -> Self {
        let (re, im): (Vec<_>, Vec<_>) = tensors.into_iter().map(|t| (t.re, t.im)).unzip();
        Self {
            re: Tensor::cat(re, dim),
            im: Tensor::cat(im, dim),
        }
    }

    /// Element-wise product with a real tensor (broadcasting).
    pub fn mul_real(self, factor: Tensor<B, D>) -> Self {
        Self {
            re: self.re * factor.clone(),
            im: self.im * factor,
        }
    }

    pub fn mul_scalar(self, factor: f64) -> Self {
        Self {
            re: self.re.mul_scalar(factor),
            im: self.im.mul_scalar(factor),
        }
    }

    pub fn sum_dim(self, dim: usize) -> Self {
        Self {
            re: self.re.sum_dim(dim),
            im: self.im.sum_dim(dim),
        }
    }

    /// Complex conjugate.
    pub fn conj(self) -> Self {
        Self {
            re: self.re,
            im: self.im.neg(),
        }
    }

    /// Matrix product `self · rhs`.
    pub fn matmul(self, rhs: Self) -> Self {
        // (a + ib)(c + id) = (ac - bd) + i(ad + bc)
        let re = self.re.clone().matmul(rhs.re.clone()) - self.im.clone().matmul(rhs.im.clone());
        let im = self.re.matmul(rhs.im) + self.im.matmul(rhs.re);
        Self { re, im }
    }

    /// Matrix product `self · conj(rhs)`.
    pub fn matmul_conj(self, rhs: Self) -> Self {
        // (a + ib)(c - id) = (ac + bd) + i(bc - ad)
        let re = self.re.clone().matmul(rhs.re.clone()) + self.im.clone().matmul(rhs.im.clone());
        let im = self.im.matmul(rhs.re) - self.re.matmul(rhs.im);
        Self { re, im }
    }
}
