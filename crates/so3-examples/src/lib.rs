//! # so3-examples utilities
//!
//! Shared pieces of the demos: seeded signals on the SOFT grid, a synthetic
//! rotation-invariant classification task, and a small residual SO(3)
//! network built from the workspace layers.

use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::tensor::activation::relu;
use burn::tensor::backend::Backend;
use burn::tensor::{ElementConversion, Int, Tensor, TensorData};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use so3_core::{ComplexTensor, GridSpec, RngKey};
use so3_fft::spectrum::spectral_indices;
use so3_fft::{nspec, so3_integrate, so3_rifft};
use so3_nn::{So3Convolution, So3ConvolutionConfig, So3Shortcut, So3ShortcutConfig};

/// Standard normal samples on a `[batch, channels, 2b, 2b, 2b]` grid.
pub fn random_signal<B: Backend>(key: RngKey, shape: [usize; 5], device: &B::Device) -> Tensor<B, 5> {
    let values = key.normal(shape.iter().product(), 0.0, 1.0);
    Tensor::from_data(TensorData::new(values, shape), device)
}

/// Rotate about the z axis by `k` alpha samples.
pub fn roll_alpha<B: Backend>(x: Tensor<B, 5>, k: usize) -> Tensor<B, 5> {
    let n = x.dims()[3];
    let k = k % n;
    if k == 0 {
        return x;
    }
    Tensor::cat(vec![x.clone().narrow(3, n - k, k), x.narrow(3, 0, n - k)], 3)
}

/// Largest absolute element-wise difference.
pub fn max_abs_diff<B: Backend, const D: usize>(a: Tensor<B, D>, b: Tensor<B, D>) -> f32 {
    (a - b).abs().max().into_scalar().elem()
}

/// Two classes of random band-limited signals that differ only in how
/// their energy spreads over degrees. No orientation carries class
/// information, so a rotation-invariant model is the right tool.
#[derive(Debug, Clone)]
pub struct SyntheticDataset<B: Backend> {
    /// `[n, 1, 2b, 2b, 2b]`
    pub signals: Tensor<B, 5>,
    pub labels: Vec<usize>,
    pub b: usize,
}

impl<B: Backend> SyntheticDataset<B> {
    /// `n` samples alternating between class 0 (energy in low degrees) and
    /// class 1 (energy in the top degree).
    pub fn generate(key: RngKey, n: usize, b: usize, device: &B::Device) -> Self {
        let (key_re, key_im) = key.split_two();
        let ns = nspec(b);
        let mut re = key_re.normal(ns * n, 0.0, 1.0);
        let mut im = key_im.normal(ns * n, 0.0, 1.0);
        let labels: Vec<usize> = (0..n).map(|i| i % 2).collect();

        // layout [nspec, n, 1]
        for (s, (l, _, _)) in spectral_indices(b).enumerate() {
            for (i, &label) in labels.iter().enumerate() {
                let amplitude = degree_profile(label, l, b);
                re[s * n + i] *= amplitude;
                im[s * n + i] *= amplitude;
            }
        }

        let spectrum = ComplexTensor::new(
            Tensor::from_data(TensorData::new(re, [ns, n, 1]), device),
            Tensor::from_data(TensorData::new(im, [ns, n, 1]), device),
        );

        Self {
            signals: so3_rifft(spectrum),
            labels,
            b,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Samples `start..end` and their labels.
    pub fn batch(&self, start: usize, end: usize) -> (Tensor<B, 5>, Tensor<B, 1, Int>) {
        let device = self.signals.device();
        let signals = self.signals.clone().narrow(0, start, end - start);
        let labels: Vec<i64> = self.labels[start..end].iter().map(|&l| l as i64).collect();
        let labels = Tensor::from_data(TensorData::new(labels, [end - start]), &device);
        (signals, labels)
    }

    /// The same dataset with every sample rotated by a random z rotation.
    pub fn rotated(&self, key: RngKey) -> Self {
        let n_alpha = 2 * self.b;
        let mut rng = ChaCha8Rng::seed_from_u64(key.seed());
        let samples = (0..self.len())
            .map(|i| {
                let sample = self.signals.clone().narrow(0, i, 1);
                roll_alpha(sample, rng.gen_range(0..n_alpha))
            })
            .collect();

        Self {
            signals: Tensor::cat(samples, 0),
            labels: self.labels.clone(),
            b: self.b,
        }
    }
}

fn degree_profile(label: usize, l: usize, b: usize) -> f32 {
    match label {
        0 => 1.0 / (1.0 + l as f32),
        _ if l + 1 == b => 1.0,
        _ => 0.1,
    }
}

/// One residual block: features and bandwidth after the block, and the
/// kernel grid of its convolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockConfig {
    pub features: usize,
    pub bandwidth: usize,
    #[serde(default = "GridSpec::near_identity_default")]
    pub grid: GridSpec,
}

/// Architecture of a [`So3Classifier`], loadable from TOML.
///
/// ```toml
/// b_in = 4
/// nfeature_in = 1
/// n_classes = 2
///
/// [[blocks]]
/// features = 8
/// bandwidth = 4
///
/// [[blocks]]
/// features = 16
/// bandwidth = 3
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub b_in: usize,
    pub nfeature_in: usize,
    pub n_classes: usize,
    pub blocks: Vec<BlockConfig>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            b_in: 4,
            nfeature_in: 1,
            n_classes: 2,
            blocks: vec![
                BlockConfig {
                    features: 8,
                    bandwidth: 4,
                    grid: GridSpec::near_identity_default(),
                },
                BlockConfig {
                    features: 16,
                    bandwidth: 3,
                    grid: GridSpec::near_identity_default(),
                },
            ],
        }
    }
}

impl NetworkConfig {
    /// Check that the blocks can be chained.
    ///
    /// Bandwidths may not grow from block to block, since the residual
    /// path cannot upsample.
    pub fn validate(&self) -> Result<(), String> {
        if self.blocks.is_empty() {
            return Err("network needs at least one block".to_string());
        }
        if self.b_in == 0 || self.nfeature_in == 0 || self.n_classes == 0 {
            return Err("b_in, nfeature_in and n_classes must be positive".to_string());
        }
        let mut b = self.b_in;
        for (i, block) in self.blocks.iter().enumerate() {
            if block.bandwidth == 0 || block.bandwidth > b {
                return Err(format!(
                    "block {} has bandwidth {}, expected 1..={}",
                    i, block.bandwidth, b
                ));
            }
            if block.features == 0 {
                return Err(format!("block {} has no features", i));
            }
            b = block.bandwidth;
        }
        Ok(())
    }

    /// Output features of the last block.
    pub fn nfeature_out(&self) -> usize {
        self.blocks.last().map_or(self.nfeature_in, |b| b.features)
    }

    pub fn init<B: Backend>(&self, key: RngKey, device: &B::Device) -> So3Classifier<B> {
        let keys = key.split(2 * self.blocks.len());
        let mut convs = Vec::with_capacity(self.blocks.len());
        let mut shortcuts = Vec::with_capacity(self.blocks.len());

        let (mut features, mut b) = (self.nfeature_in, self.b_in);
        for (i, block) in self.blocks.iter().enumerate() {
            convs.push(
                So3ConvolutionConfig::new(features, block.features, b, block.bandwidth)
                    .with_grid(block.grid.clone())
                    .init_with(keys[2 * i], device),
            );
            shortcuts.push(
                So3ShortcutConfig::new(features, block.features, b, block.bandwidth)
                    .init_with(keys[2 * i + 1], device),
            );
            features = block.features;
            b = block.bandwidth;
        }

        So3Classifier {
            convs,
            shortcuts,
            head: LinearConfig::new(self.nfeature_out(), self.n_classes).init(device),
        }
    }
}

/// Residual SO(3) blocks, global integration, and a linear head.
#[derive(Module, Debug)]
pub struct So3Classifier<B: Backend> {
    convs: Vec<So3Convolution<B>>,
    shortcuts: Vec<So3Shortcut<B>>,
    head: Linear<B>,
}

impl<B: Backend> So3Classifier<B> {
    /// Rotation-invariant features `[batch, nfeature_out]`.
    pub fn features(&self, x: Tensor<B, 5>) -> Tensor<B, 2> {
        let mut h = x;
        for (conv, shortcut) in self.convs.iter().zip(&self.shortcuts) {
            h = relu(conv.forward(h.clone())) + shortcut.forward(h);
        }
        so3_integrate(h)
    }

    /// Class logits `[batch, n_classes]`.
    pub fn forward(&self, x: Tensor<B, 5>) -> Tensor<B, 2> {
        self.head.forward(self.features(x))
    }
}

/// Hyperparameters of the invariant classification demo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub learning_rate: f64,
    pub epochs: usize,
    pub batch_size: usize,
    pub n_train: usize,
    pub n_test: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: 5e-3,
            epochs: 20,
            batch_size: 8,
            n_train: 64,
            n_test: 32,
        }
    }
}

/// Fraction of rows whose argmax matches `labels`.
pub fn accuracy<B: Backend>(logits: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> f32 {
    let n = labels.dims()[0];
    if n == 0 {
        return 0.0;
    }
    let predicted = logits.argmax(1).reshape([n]);
    let correct: i64 = predicted.equal(labels).int().sum().into_scalar().elem();
    correct as f32 / n as f32
}
