//! Runtime configuration for SO(3) workloads.
//!
//! This module resolves the settings shared by layers, transforms and demos:
//! - **Seed**: default RNG key for parameter initialization
//! - **Device**: CPU (`NdArray`) or GPU (`Wgpu`, `gpu` feature)
//! - **Table cache capacity**: how many precomputed Wigner/DFT tables stay resident
//! - **Output directory**: where demos write reports
//!
//! Settings can be configured via:
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`SO3_*`)
//! 3. Config file (`~/.config/so3conv/config.toml`)
//! 4. Defaults
//!
//! # Example
//!
//! ```ignore
//! use so3_core::config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_args();
//! let key = config.rng_key();
//! let report = config.output_dir().join("forward_pass.json");
//! ```

use clap::{Parser, ValueEnum};
use directories::ProjectDirs;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::rng::RngKey;

/// Global runtime configuration instance
static GLOBAL_CONFIG: OnceCell<RuntimeConfig> = OnceCell::new();

/// Default capacity of the transform table cache.
pub const DEFAULT_TABLE_CACHE_CAPACITY: usize = 32;

/// Default seed for parameter initialization.
pub const DEFAULT_SEED: u64 = 42;

/// Execution device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    #[default]
    Cpu,
    Gpu,
}

/// CLI arguments for runtime configuration.
///
/// Flatten into a binary's own parser with `#[command(flatten)]`.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about = "SO(3) runtime configuration")]
pub struct RuntimeArgs {
    /// Seed for parameter initialization
    #[arg(long, env = "SO3_SEED")]
    pub seed: Option<u64>,

    /// Execution device
    #[arg(long, value_enum, env = "SO3_DEVICE")]
    pub device: Option<DeviceKind>,

    /// Number of precomputed transform tables kept in memory
    #[arg(long, env = "SO3_TABLE_CACHE")]
    pub table_cache_capacity: Option<usize>,

    /// Output directory for demo reports
    #[arg(long, env = "SO3_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Path to config file
    #[arg(long, env = "SO3_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,
}

/// Runtime configuration as stored in the config file.
///
/// # Example TOML
///
/// ```toml
/// seed = 7
/// device = "cpu"
/// table_cache_capacity = 64
/// output_dir = "/tmp/so3conv"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfigFile {
    pub seed: Option<u64>,
    pub device: Option<DeviceKind>,
    pub table_cache_capacity: Option<usize>,
    pub output_dir: Option<PathBuf>,
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    seed: u64,
    device: DeviceKind,
    table_cache_capacity: usize,
    output_dir: PathBuf,
}

impl RuntimeConfig {
    /// Parse configuration from CLI arguments.
    pub fn from_args() -> Self {
        Self::from_runtime_args(RuntimeArgs::parse())
    }

    /// Parse configuration from CLI arguments, ignoring anything unknown.
    ///
    /// Use this when mixing with other CLI parsers.
    pub fn from_args_relaxed() -> Self {
        let args = RuntimeArgs::try_parse().unwrap_or_default();
        Self::from_runtime_args(args)
    }

    /// Resolve configuration from already-parsed arguments.
    ///
    /// Priority order: arguments (which already include the environment),
    /// then the config file, then defaults.
    pub fn from_runtime_args(args: RuntimeArgs) -> Self {
        let file_config = Self::load_config_file(args.config_file.as_deref());
        let defaults = Self::default();

        RuntimeConfig {
            seed: args.seed.or(file_config.seed).unwrap_or(defaults.seed),
            device: args.device.or(file_config.device).unwrap_or(defaults.device),
            table_cache_capacity: args
                .table_cache_capacity
                .or(file_config.table_cache_capacity)
                .unwrap_or(defaults.table_cache_capacity),
            output_dir: args
                .output_dir
                .or(file_config.output_dir)
                .unwrap_or(defaults.output_dir),
        }
    }

    /// Create a new builder for custom configuration
    pub fn builder() -> RuntimeConfigBuilder {
        RuntimeConfigBuilder::default()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn rng_key(&self) -> RngKey {
        RngKey::new(self.seed)
    }

    pub fn device(&self) -> DeviceKind {
        self.device
    }

    pub fn table_cache_capacity(&self) -> usize {
        self.table_cache_capacity
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Ensure the output directory exists
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.output_dir)
    }

    /// Get the global configuration instance.
    ///
    /// Initializes from the relaxed CLI parse on first call. Use `set_global`
    /// to install a custom configuration before anything reads it.
    pub fn global() -> &'static RuntimeConfig {
        GLOBAL_CONFIG.get_or_init(RuntimeConfig::from_args_relaxed)
    }

    /// Set the global configuration.
    ///
    /// Returns Err if already initialized
    pub fn set_global(config: RuntimeConfig) -> Result<(), RuntimeConfig> {
        GLOBAL_CONFIG.set(config)
    }

    /// Log a configuration summary at info level.
    pub fn log_summary(&self) {
        log::info!(
            "SO(3) runtime: seed={}, device={:?}, table_cache={}, output={:?}",
            self.seed,
            self.device,
            self.table_cache_capacity,
            self.output_dir
        );
    }

    fn default_output_dir() -> PathBuf {
        if let Some(proj_dirs) = ProjectDirs::from("", "", "so3conv") {
            proj_dirs.data_dir().join("output")
        } else {
            let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            cwd.join("output")
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "so3conv").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load config file from path or default location.
    ///
    /// A missing or unparsable file yields an empty configuration.
    fn load_config_file(path: Option<&Path>) -> RuntimeConfigFile {
        let Some(path) = path.map(PathBuf::from).or_else(Self::default_config_path) else {
            return RuntimeConfigFile::default();
        };

        if !path.exists() {
            return RuntimeConfigFile::default();
        }

        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<RuntimeConfigFile>(&contents) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("Ignoring malformed config file {:?}: {}", path, e);
                    RuntimeConfigFile::default()
                }
            },
            Err(e) => {
                log::warn!("Failed to read config file {:?}: {}", path, e);
                RuntimeConfigFile::default()
            }
        }
    }

    /// Save current configuration to a file
    pub fn save_to_file(&self, path: &Path) -> std::io::Result<()> {
        let config = RuntimeConfigFile {
            seed: Some(self.seed),
            device: Some(self.device),
            table_cache_capacity: Some(self.table_cache_capacity),
            output_dir: Some(self.output_dir.clone()),
        };

        let toml_str = toml::to_string_pretty(&config)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, toml_str)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            seed: DEFAULT_SEED,
            device: DeviceKind::default(),
            table_cache_capacity: DEFAULT_TABLE_CACHE_CAPACITY,
            output_dir: Self::default_output_dir(),
        }
    }
}

/// Builder for RuntimeConfig
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfigBuilder {
    seed: Option<u64>,
    device: Option<DeviceKind>,
    table_cache_capacity: Option<usize>,
    output_dir: Option<PathBuf>,
}

impl RuntimeConfigBuilder {
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn device(mut self, device: DeviceKind) -> Self {
        self.device = Some(device);
        self
    }

    pub fn table_cache_capacity(mut self, capacity: usize) -> Self {
        self.table_cache_capacity = Some(capacity);
        self
    }

    pub fn output_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    pub fn build(self) -> RuntimeConfig {
        let defaults = RuntimeConfig::default();
        RuntimeConfig {
            seed: self.seed.unwrap_or(defaults.seed),
            device: self.device.unwrap_or(defaults.device),
            table_cache_capacity: self
                .table_cache_capacity
                .unwrap_or(defaults.table_cache_capacity),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
        }
    }
}
