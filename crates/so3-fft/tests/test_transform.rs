//! End-to-end checks of the transforms on band-limited signals.

use burn::tensor::{Distribution, Tensor};
use so3_core::backend::{init_cpu_device, CpuBackend};
use so3_core::{ComplexTensor, So3Grid};
use so3_fft::{nspec, so3_integrate, so3_local_ft, so3_mm, so3_rfft, so3_rifft};

type B = CpuBackend;

/// A real signal whose spectrum vanishes for degrees `>= b`.
fn band_limited_signal(b: usize, batch: usize, channels: usize) -> Tensor<B, 5> {
    let device = init_cpu_device();
    let shape = [nspec(b), batch, channels];
    let spectrum = ComplexTensor::new(
        Tensor::random(shape, Distribution::Normal(0.0, 1.0), &device),
        Tensor::random(shape, Distribution::Normal(0.0, 1.0), &device),
    );
    so3_rifft(spectrum)
}

fn max_abs_diff(a: Tensor<B, 5>, b: Tensor<B, 5>) -> f32 {
    let a: Vec<f32> = a.into_data().to_vec().unwrap();
    let b: Vec<f32> = b.into_data().to_vec().unwrap();
    a.iter()
        .zip(&b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f32::max)
}

fn max_abs(a: Tensor<B, 5>) -> f32 {
    let a: Vec<f32> = a.into_data().to_vec().unwrap();
    a.iter().map(|x| x.abs()).fold(0.0, f32::max)
}

#[test]
fn test_round_trip_recovers_band_limited_signal() {
    let b = 4;
    let signal = band_limited_signal(b, 2, 3);
    let scale = max_abs(signal.clone());

    let recovered = so3_rifft(so3_rfft(signal.clone(), b));

    assert_eq!(recovered.dims(), signal.dims());
    let err = max_abs_diff(recovered, signal);
    assert!(err < 1e-3 * scale.max(1.0), "round trip error {}", err);
}

#[test]
fn test_downsampling_keeps_low_degrees() {
    // a bandwidth-2 signal sampled at b=4 survives transform to b=2 and back
    let low = band_limited_signal(2, 1, 2);
    let spectrum_low = so3_rfft(low.clone(), 2);
    let fine = so3_rifft(ComplexTensor::cat(
        vec![
            spectrum_low.clone(),
            ComplexTensor::zeros([nspec(4) - nspec(2), 1, 2], &init_cpu_device()),
        ],
        0,
    ));
    assert_eq!(fine.dims(), [1, 2, 8, 8, 8]);

    let back = so3_rifft(so3_rfft(fine, 2));
    let err = max_abs_diff(back, low.clone());
    assert!(err < 1e-3 * max_abs(low).max(1.0), "resampling error {}", err);
}

#[test]
fn test_identity_kernel_scales_by_grid_size() {
    let b = 3;
    let device = init_cpu_device();
    let signal = band_limited_signal(b, 1, 1);
    let kernel = Tensor::<B, 3>::ones([1, 1, 1], &device);

    let spectrum = so3_mm(
        so3_rfft(signal.clone(), b),
        so3_local_ft(kernel, b, &So3Grid::identity()).permute([2, 0, 1]),
    );
    let out = so3_rifft(spectrum);

    let expected = signal.mul_scalar((2 * b) as f64);
    let err = max_abs_diff(out, expected.clone());
    assert!(err < 1e-3 * max_abs(expected).max(1.0), "identity conv error {}", err);
}

#[test]
fn test_integral_reads_degree_zero_coefficient() {
    let b = 3;
    let signal = band_limited_signal(b, 2, 2);
    let integral: Vec<f32> = so3_integrate(signal.clone()).into_data().to_vec().unwrap();
    let f0: Vec<f32> = so3_rfft(signal, b)
        .re
        .narrow(0, 0, 1)
        .into_data()
        .to_vec()
        .unwrap();

    for (a, c) in integral.iter().zip(&f0) {
        assert!((a - c).abs() < 1e-4 * a.abs().max(1.0), "{} vs {}", a, c);
    }
}
