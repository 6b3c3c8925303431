//! Behavioural tests for the convolution and shortcut layers.

use burn::backend::Autodiff;
use burn::tensor::{Distribution, Tensor, TensorData};
use so3_core::backend::{init_cpu_device, CpuBackend};
use so3_core::{ComplexTensor, GridSpec, RngKey};
use so3_fft::wigner::wigner_big_d;
use so3_fft::{bandwidth_from_nspec, so3_rfft, so3_rifft, spectral_index};
use so3_nn::{So3ConvolutionConfig, So3ShortcutConfig};

type B = CpuBackend;

fn random_signal(shape: [usize; 5]) -> Tensor<B, 5> {
    Tensor::random(shape, Distribution::Normal(0.0, 1.0), &init_cpu_device())
}

fn to_vec<const D: usize>(t: Tensor<B, D>) -> Vec<f32> {
    t.into_data().to_vec().unwrap()
}

/// Shift the alpha axis by `k` samples.
fn roll_alpha(x: Tensor<B, 5>, k: usize) -> Tensor<B, 5> {
    let n = x.dims()[3];
    Tensor::cat(vec![x.clone().narrow(3, n - k, k), x.narrow(3, 0, n - k)], 3)
}

/// Rotate a `[nspec, batch, channels]` spectrum by `R = (alpha, beta, gamma)`:
/// every degree block is left-multiplied by `conj(D^l(R))`.
fn rotate_spectrum(z: ComplexTensor<B, 3>, alpha: f64, beta: f64, gamma: f64) -> ComplexTensor<B, 3> {
    let [ns, batch, channels] = z.dims();
    let b = bandwidth_from_nspec(ns).expect("valid spectral length");
    let bc = batch * channels;
    let re = to_vec(z.re);
    let im = to_vec(z.im);
    let mut out_re = vec![0.0f32; re.len()];
    let mut out_im = vec![0.0f32; im.len()];

    for l in 0..b {
        let li = l as i64;
        let width = 2 * l + 1;
        let (d_re, d_im) = wigner_big_d(l, alpha, beta, gamma);
        for m in -li..=li {
            for n in -li..=li {
                let dst = spectral_index(l, m, n);
                for k in -li..=li {
                    let d = (m + li) as usize * width + (k + li) as usize;
                    // conj(D)
                    let (ur, ui) = (d_re[d], -d_im[d]);
                    let src = spectral_index(l, k, n);
                    for c in 0..bc {
                        let (fr, fi) = (re[src * bc + c] as f64, im[src * bc + c] as f64);
                        out_re[dst * bc + c] += (ur * fr - ui * fi) as f32;
                        out_im[dst * bc + c] += (ur * fi + ui * fr) as f32;
                    }
                }
            }
        }
    }

    let device = init_cpu_device();
    ComplexTensor::new(
        Tensor::from_data(TensorData::new(out_re, [ns, batch, channels]), &device),
        Tensor::from_data(TensorData::new(out_im, [ns, batch, channels]), &device),
    )
}

#[test]
fn test_output_shape() {
    let device = init_cpu_device();
    let cases = [(2, 3, 3, 2), (1, 4, 2, 3), (3, 3, 4, 4)];
    for (fin, fout, b_in, b_out) in cases {
        let layer = So3ConvolutionConfig::new(fin, fout, b_in, b_out)
            .with_grid(GridSpec::near_identity_default())
            .init_with::<B>(RngKey::new(1), &device);
        let out = layer.forward(random_signal([2, fin, 2 * b_in, 2 * b_in, 2 * b_in]));
        assert_eq!(out.dims(), [2, fout, 2 * b_out, 2 * b_out, 2 * b_out]);
    }
}

#[test]
#[should_panic(expected = "shape mismatch")]
fn test_forward_rejects_wrong_grid_size() {
    let device = init_cpu_device();
    let layer = So3ConvolutionConfig::new(1, 1, 3, 3).init::<B>(&device);
    layer.forward(random_signal([1, 1, 6, 6, 4]));
}

#[test]
#[should_panic(expected = "shape mismatch")]
fn test_forward_rejects_wrong_channels() {
    let device = init_cpu_device();
    let layer = So3ConvolutionConfig::new(2, 1, 2, 2).init::<B>(&device);
    layer.forward(random_signal([1, 3, 4, 4, 4]));
}

#[test]
fn test_try_forward_reports_mismatch() {
    let device = init_cpu_device();
    let layer = So3ConvolutionConfig::new(2, 1, 2, 2).init::<B>(&device);

    let err = layer.try_forward(random_signal([1, 2, 6, 6, 6])).unwrap_err();
    assert!(err.to_string().contains("shape mismatch"));
    assert!(layer.try_forward(random_signal([1, 2, 4, 4, 4])).is_ok());
}

#[test]
fn test_empty_batch_keeps_output_shape() {
    let device = init_cpu_device();
    let layer = So3ConvolutionConfig::new(1, 2, 2, 2)
        .with_grid(GridSpec::near_identity_default())
        .init_with::<B>(RngKey::new(5), &device);

    let out = layer.forward(Tensor::zeros([0, 1, 4, 4, 4], &device));
    assert_eq!(out.dims(), [0, 2, 4, 4, 4]);

    let shortcut = So3ShortcutConfig::new(1, 2, 2, 2).init::<B>(&device);
    assert_eq!(shortcut.forward(Tensor::zeros([0, 1, 4, 4, 4], &device)).dims(), [0, 2, 4, 4, 4]);
}

#[test]
fn test_shortcut_identity_returns_input() {
    let device = init_cpu_device();
    let shortcut = So3ShortcutConfig::new(3, 3, 2, 2).init::<B>(&device);
    assert!(shortcut.is_identity());

    let x = random_signal([2, 3, 4, 4, 4]);
    let y = shortcut.forward(x.clone());
    assert_eq!(to_vec(y), to_vec(x));
}

#[test]
fn test_shortcut_projection_shape() {
    let device = init_cpu_device();
    let shortcut = So3ShortcutConfig::new(3, 5, 3, 2).init::<B>(&device);
    assert!(!shortcut.is_identity());
    let y = shortcut.forward(random_signal([1, 3, 6, 6, 6]));
    assert_eq!(y.dims(), [1, 5, 4, 4, 4]);
}

#[test]
fn test_initialization_statistics() {
    let device = init_cpu_device();
    let layer = So3ConvolutionConfig::new(8, 16, 4, 2)
        .with_grid(GridSpec::near_identity_default())
        .init_with::<B>(RngKey::new(2024), &device);

    let expected = layer.kernel_std();
    assert!((expected - 1.0 / (192.0f64 * 8.0 * 0.125).sqrt()).abs() < 1e-12);

    let values = to_vec(layer.kernel());
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    let var = values
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    assert!((var.sqrt() - expected).abs() < 0.03 * expected, "std {} vs {}", var.sqrt(), expected);

    assert!(to_vec(layer.bias()).iter().all(|&v| v == 0.0));
}

#[test]
fn test_bias_shifts_only_its_channel() {
    let device = init_cpu_device();
    let layer = So3ConvolutionConfig::new(2, 3, 2, 2)
        .with_grid(GridSpec::near_identity_default())
        .init_with::<B>(RngKey::new(3), &device);
    let x = random_signal([2, 2, 4, 4, 4]);

    let base = to_vec(layer.forward(x.clone()));
    let bias = Tensor::<B, 5>::from_data(TensorData::new(vec![0.0f32, 1.5, 0.0], [1, 3, 1, 1, 1]), &device);
    let shifted = to_vec(layer.with_bias(bias).forward(x));

    // [batch, channel, 64 samples]
    let per_channel = 4 * 4 * 4;
    for (i, (a, b)) in base.iter().zip(&shifted).enumerate() {
        let channel = (i / per_channel) % 3;
        let delta = if channel == 1 { 1.5 } else { 0.0 };
        assert!((b - a - delta).abs() < 1e-5, "index {}: {} -> {}", i, a, b);
    }
}

#[test]
fn test_forward_is_deterministic() {
    let device = init_cpu_device();
    let config = So3ConvolutionConfig::new(2, 2, 3, 2).with_grid(GridSpec::equatorial_default());
    let a = config.init_with::<B>(RngKey::new(11), &device);
    let b = config.init_with::<B>(RngKey::new(11), &device);
    let x = random_signal([1, 2, 6, 6, 6]);

    let first = to_vec(a.forward(x.clone()));
    assert_eq!(first, to_vec(a.forward(x.clone())));
    assert_eq!(first, to_vec(b.forward(x)));
}

#[test]
fn test_alpha_rotation_commutes_with_convolution() {
    let device = init_cpu_device();
    let b = 3;
    let layer = So3ConvolutionConfig::new(2, 2, b, b)
        .with_grid(GridSpec::near_identity_default())
        .init_with::<B>(RngKey::new(9), &device);
    let x = random_signal([1, 2, 2 * b, 2 * b, 2 * b]);

    let rotated_then_conv = to_vec(layer.forward(roll_alpha(x.clone(), 2)));
    let conv_then_rotated = to_vec(roll_alpha(layer.forward(x), 2));

    let scale = conv_then_rotated.iter().fold(1.0f32, |m, v| m.max(v.abs()));
    for (a, c) in rotated_then_conv.iter().zip(&conv_then_rotated) {
        assert!((a - c).abs() < 1e-4 * scale, "{} vs {}", a, c);
    }
}

#[test]
fn test_general_rotation_commutes_with_convolution() {
    let device = init_cpu_device();
    let (b_in, b_out) = (3, 2);
    let (alpha, beta, gamma) = (0.7, 1.1, -0.4);
    let layer = So3ConvolutionConfig::new(2, 3, b_in, b_out)
        .with_grid(GridSpec::near_identity_default())
        .init_with::<B>(RngKey::new(21), &device);

    // band-limit the input so rotation by a spectral map is exact
    let spectrum = so3_rfft(random_signal([2, 2, 2 * b_in, 2 * b_in, 2 * b_in]), b_in);
    let x = so3_rifft(spectrum.clone());
    let x_rotated = so3_rifft(rotate_spectrum(spectrum, alpha, beta, gamma));

    let rotated_then_conv = to_vec(layer.forward(x_rotated));
    let conv_then_rotated = to_vec(so3_rifft(rotate_spectrum(
        so3_rfft(layer.forward(x), b_out),
        alpha,
        beta,
        gamma,
    )));

    let scale = conv_then_rotated.iter().fold(1.0f32, |m, v| m.max(v.abs()));
    for (a, c) in rotated_then_conv.iter().zip(&conv_then_rotated) {
        assert!((a - c).abs() < 1e-3 * scale, "{} vs {}", a, c);
    }
}

#[test]
fn test_gradients_reach_parameters() {
    type AB = Autodiff<CpuBackend>;
    let device = init_cpu_device();
    let layer = So3ConvolutionConfig::new(2, 2, 2, 2)
        .with_grid(GridSpec::near_identity_default())
        .init_with::<AB>(RngKey::new(4), &device);
    let x: Tensor<AB, 5> = Tensor::random([2, 2, 4, 4, 4], Distribution::Normal(0.0, 1.0), &device);

    let loss = layer.forward(x).powf_scalar(2.0).mean();
    let grads = loss.backward();

    let kernel_grad = layer.kernel().grad(&grads).expect("kernel gradient");
    let bias_grad = layer.bias().grad(&grads).expect("bias gradient");
    assert_eq!(kernel_grad.dims(), [2, 2, 192]);
    assert_eq!(bias_grad.dims(), [1, 2, 1, 1, 1]);

    let kernel_grad: Vec<f32> = kernel_grad.into_data().to_vec().unwrap();
    assert!(kernel_grad.iter().all(|v| v.is_finite()));
    assert!(kernel_grad.iter().any(|v| v.abs() > 0.0));
}

#[test]
fn test_config_roundtrips_through_toml_and_json() {
    let config = So3ConvolutionConfig::new(8, 16, 8, 6).with_grid(GridSpec::near_identity_default());

    let text = toml::to_string(&config).expect("toml serialize");
    let back: So3ConvolutionConfig = toml::from_str(&text).expect("toml deserialize");
    assert_eq!(back, config);

    let json = serde_json::to_string(&config).expect("json serialize");
    let back: So3ConvolutionConfig = serde_json::from_str(&json).expect("json deserialize");
    assert_eq!(back, config);

    // grid defaults to the identity point
    let minimal: So3ConvolutionConfig =
        toml::from_str("nfeature_in = 1\nnfeature_out = 2\nb_in = 3\nb_out = 3\n").expect("minimal");
    assert_eq!(minimal.grid, GridSpec::Identity);
}
