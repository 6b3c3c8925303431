//! Benchmarks for the SO(3) transforms and the spectral product.

use burn::tensor::{Distribution, Tensor};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use so3_core::backend::{init_cpu_device, CpuBackend};
use so3_fft::{nspec, so3_mm, so3_rfft, so3_rifft};

fn benchmark_rfft(c: &mut Criterion) {
    let device = init_cpu_device();
    let mut group = c.benchmark_group("so3_rfft");

    for b in [4usize, 8, 12].iter() {
        let n = 2 * b;
        let x: Tensor<CpuBackend, 5> =
            Tensor::random([4, 8, n, n, n], Distribution::Normal(0.0, 1.0), &device);

        // warm the table cache outside the timed loop
        let _ = so3_rfft(x.clone(), *b);

        group.bench_with_input(BenchmarkId::from_parameter(b), b, |bench, &b| {
            bench.iter(|| so3_rfft(black_box(x.clone()), b));
        });
    }

    group.finish();
}

fn benchmark_rifft(c: &mut Criterion) {
    let device = init_cpu_device();
    let mut group = c.benchmark_group("so3_rifft");

    for b in [4usize, 8, 12].iter() {
        let n = 2 * b;
        let x: Tensor<CpuBackend, 5> =
            Tensor::random([4, 8, n, n, n], Distribution::Normal(0.0, 1.0), &device);
        let spectrum = so3_rfft(x, *b);
        let _ = so3_rifft(spectrum.clone());

        group.bench_with_input(BenchmarkId::from_parameter(b), b, |bench, _| {
            bench.iter(|| so3_rifft(black_box(spectrum.clone())));
        });
    }

    group.finish();
}

fn benchmark_mm(c: &mut Criterion) {
    let device = init_cpu_device();
    let mut group = c.benchmark_group("so3_mm");

    for b in [4usize, 8, 12].iter() {
        let ns = nspec(*b);
        let random = |shape: [usize; 3]| -> so3_core::ComplexTensor<CpuBackend, 3> {
            so3_core::ComplexTensor::new(
                Tensor::random(shape, Distribution::Normal(0.0, 1.0), &device),
                Tensor::random(shape, Distribution::Normal(0.0, 1.0), &device),
            )
        };
        let x = random([ns, 4, 16]);
        let y = random([ns, 16, 16]);

        group.bench_with_input(BenchmarkId::from_parameter(b), b, |bench, _| {
            bench.iter(|| so3_mm(black_box(x.clone()), black_box(y.clone())));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_rfft, benchmark_rifft, benchmark_mm);
criterion_main!(benches);
