//! Run one SO(3) convolution on random input and report timing and
//! equivariance error.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example forward_pass --release -- \
//!   --b-in 8 --b-out 6 \
//!   --features-in 4 --features-out 8 \
//!   --batch 2
//!
//! # Layer described in TOML (see So3ConvolutionConfig)
//! cargo run --example forward_pass --release -- --layer layer.toml
//!
//! # Runtime settings
//! SO3_SEED=7 SO3_TABLE_CACHE=64 cargo run --example forward_pass -- --output-dir /tmp/so3
//! ```

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use burn::tensor::backend::Backend;
use clap::Parser;
use serde::Serialize;
use so3_core::backend::{init_cpu_device, CpuBackend};
use so3_core::{DeviceKind, GridSpec, RuntimeArgs, RuntimeConfig};
use so3_examples::{max_abs_diff, random_signal, roll_alpha};
use so3_nn::So3ConvolutionConfig;

#[derive(Parser)]
#[command(name = "forward_pass")]
#[command(author, version, about = "Forward pass of an SO(3) convolution layer")]
struct Args {
    #[command(flatten)]
    runtime: RuntimeArgs,

    /// Layer config file (TOML); overrides the shape flags below
    #[arg(long)]
    layer: Option<PathBuf>,

    /// Input bandwidth
    #[arg(long, default_value = "8")]
    b_in: usize,

    /// Output bandwidth
    #[arg(long, default_value = "6")]
    b_out: usize,

    /// Input channels
    #[arg(long, default_value = "4")]
    features_in: usize,

    /// Output channels
    #[arg(long, default_value = "8")]
    features_out: usize,

    /// Batch size
    #[arg(long, default_value = "2")]
    batch: usize,

    /// Number of timed forward passes
    #[arg(long, default_value = "3")]
    repeats: usize,
}

#[derive(Serialize)]
struct Report {
    layer: So3ConvolutionConfig,
    seed: u64,
    grid_points: usize,
    kernel_std: f64,
    input_shape: [usize; 5],
    output_shape: [usize; 5],
    first_pass_ms: f64,
    mean_pass_ms: f64,
    equivariance_error: Option<f32>,
    cached_tables: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let runtime = RuntimeConfig::from_runtime_args(args.runtime.clone());
    runtime.log_summary();
    so3_fft::cache::set_capacity(runtime.table_cache_capacity());

    let layer = match &args.layer {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read layer config {:?}", path))?;
            toml::from_str(&text).with_context(|| format!("Invalid layer config {:?}", path))?
        }
        None => So3ConvolutionConfig::new(args.features_in, args.features_out, args.b_in, args.b_out)
            .with_grid(GridSpec::near_identity_default()),
    };

    let report = match runtime.device() {
        DeviceKind::Cpu => run::<CpuBackend>(&args, &runtime, layer, &init_cpu_device())?,
        #[cfg(feature = "gpu")]
        DeviceKind::Gpu => {
            use so3_core::backend::{init_gpu_device, WgpuBackend};
            run::<WgpuBackend>(&args, &runtime, layer, &init_gpu_device())?
        }
        #[cfg(not(feature = "gpu"))]
        DeviceKind::Gpu => anyhow::bail!("GPU requested but so3-examples was built without the `gpu` feature"),
    };

    runtime
        .ensure_dirs()
        .context("Failed to create output directory")?;
    let path = runtime.output_dir().join("forward_pass.json");
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(&path, json).with_context(|| format!("Failed to write {:?}", path))?;

    println!("=== SO(3) Convolution Forward Pass ===\n");
    println!("  Input:        {:?}", report.input_shape);
    println!("  Output:       {:?}", report.output_shape);
    println!("  Grid points:  {}", report.grid_points);
    println!("  Kernel std:   {:.5}", report.kernel_std);
    println!("  First pass:   {:.1} ms (includes table construction)", report.first_pass_ms);
    println!("  Mean pass:    {:.1} ms", report.mean_pass_ms);
    match report.equivariance_error {
        Some(err) => println!("  Equivariance: max |conv(Rx) - R conv(x)| = {:.2e}", err),
        None => println!("  Equivariance: skipped (b_in != b_out)"),
    }
    println!("\nReport written to {:?}", path);

    Ok(())
}

fn run<B: Backend>(
    args: &Args,
    runtime: &RuntimeConfig,
    config: So3ConvolutionConfig,
    device: &B::Device,
) -> Result<Report> {
    let (layer_key, input_key) = runtime.rng_key().split_two();
    let conv = config.init_with::<B>(layer_key, device);

    let n = 2 * config.b_in;
    let input_shape = [args.batch, config.nfeature_in, n, n, n];
    let x = random_signal::<B>(input_key, input_shape, device);

    let start = Instant::now();
    let y = conv.try_forward(x.clone())?;
    let first_pass_ms = start.elapsed().as_secs_f64() * 1e3;
    let output_shape = y.dims();

    let repeats = args.repeats.max(1);
    let start = Instant::now();
    for _ in 0..repeats {
        let _ = conv.forward(x.clone());
    }
    let mean_pass_ms = start.elapsed().as_secs_f64() * 1e3 / repeats as f64;

    // A z rotation by one alpha step is a roll of the alpha axis on both grids
    // only when they have the same resolution
    let equivariance_error = (config.b_in == config.b_out).then(|| {
        let rotated_first = conv.forward(roll_alpha(x.clone(), 1));
        let rotated_after = roll_alpha(y.clone(), 1);
        max_abs_diff(rotated_first, rotated_after)
    });

    log::info!("Forward pass done: {:?} -> {:?}", input_shape, output_shape);

    Ok(Report {
        grid_points: conv.grid().len(),
        kernel_std: conv.kernel_std(),
        layer: config,
        seed: runtime.seed(),
        input_shape,
        output_shape,
        first_pass_ms,
        mean_pass_ms,
        equivariance_error,
        cached_tables: so3_fft::cache::len(),
    })
}
