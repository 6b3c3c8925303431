//! Residual shortcut between SO(3) feature maps.

use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};
use so3_core::{GridSpec, RngKey};

use crate::conv::{So3Convolution, So3ConvolutionConfig};

/// Construction parameters of a [`So3Shortcut`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct So3ShortcutConfig {
    pub nfeature_in: usize,
    pub nfeature_out: usize,
    pub b_in: usize,
    pub b_out: usize,
}

impl So3ShortcutConfig {
    pub fn new(nfeature_in: usize, nfeature_out: usize, b_in: usize, b_out: usize) -> Self {
        Self {
            nfeature_in,
            nfeature_out,
            b_in,
            b_out,
        }
    }

    /// True when the shortcut passes its input through untouched.
    pub fn is_identity(&self) -> bool {
        self.nfeature_in == self.nfeature_out && self.b_in == self.b_out
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> So3Shortcut<B> {
        self.init_with(RngKey::from_entropy(), device)
    }

    /// # Panics
    ///
    /// Panics if `b_out > b_in`.
    pub fn init_with<B: Backend>(&self, key: RngKey, device: &B::Device) -> So3Shortcut<B> {
        assert!(
            self.b_out <= self.b_in,
            "shortcut cannot upsample: b_out ({}) > b_in ({})",
            self.b_out,
            self.b_in
        );

        let conv = (!self.is_identity()).then(|| {
            So3ConvolutionConfig::new(self.nfeature_in, self.nfeature_out, self.b_in, self.b_out)
                .with_grid(GridSpec::Identity)
                .init_with(key, device)
        });
        So3Shortcut { conv }
    }
}

/// Identity when shapes agree, otherwise a convolution with the
/// single-point identity grid that changes channels and bandwidth.
#[derive(Module, Debug)]
pub struct So3Shortcut<B: Backend> {
    conv: Option<So3Convolution<B>>,
}

impl<B: Backend> So3Shortcut<B> {
    pub fn is_identity(&self) -> bool {
        self.conv.is_none()
    }

    pub fn conv(&self) -> Option<&So3Convolution<B>> {
        self.conv.as_ref()
    }

    pub fn forward(&self, x: Tensor<B, 5>) -> Tensor<B, 5> {
        match &self.conv {
            Some(conv) => conv.forward(x),
            None => x,
        }
    }
}
