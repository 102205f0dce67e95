use std::fs;
use std::path::{Path, PathBuf};

use psn_check::CheckerConfig;
use psn_core::errors::{ErrorInfo, PsnError};
use psn_core::{NoiseKind, SweepParams, DEFAULT_BLOCK_SIZE, DEFAULT_CONVERGENCE_MARGIN};
use serde::{Deserialize, Serialize};

use crate::render::RendererSpec;

/// Scheduler configuration controlling how many sweeps run at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scheduler {
    #[serde(default = "Scheduler::default_parallelism")]
    pub parallelism: usize,
}

impl Scheduler {
    const fn default_parallelism() -> usize {
        1
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            parallelism: Self::default_parallelism(),
        }
    }
}

/// Values applied to every sweep that does not override them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepDefaults {
    #[serde(default = "default_block_size")]
    pub block_size: u64,
    #[serde(default)]
    pub clock_upper: Option<u64>,
    #[serde(default = "default_margin")]
    pub convergence_margin: f64,
    #[serde(default)]
    pub checker_options: Vec<String>,
}

fn default_block_size() -> u64 {
    DEFAULT_BLOCK_SIZE
}

fn default_margin() -> f64 {
    DEFAULT_CONVERGENCE_MARGIN
}

impl Default for SweepDefaults {
    fn default() -> Self {
        Self {
            block_size: default_block_size(),
            clock_upper: None,
            convergence_margin: default_margin(),
            checker_options: Vec::new(),
        }
    }
}

/// One sweep of a batch plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepEntry {
    pub size: u32,
    pub noise: NoiseKind,
    pub threshold: u32,
    pub stride: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clock_upper: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub convergence_margin: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checker_options: Option<Vec<String>>,
}

impl SweepEntry {
    pub fn new(size: u32, noise: NoiseKind, threshold: u32, stride: u64) -> Self {
        Self {
            size,
            noise,
            threshold,
            stride,
            block_size: None,
            clock_upper: None,
            convergence_margin: None,
            checker_options: None,
        }
    }

    /// Resolves the entry against `defaults` into validated parameters.
    pub fn to_params(&self, defaults: &SweepDefaults) -> Result<SweepParams, PsnError> {
        let params = SweepParams {
            topology_size: self.size,
            noise_kind: self.noise,
            threshold: self.threshold,
            stride: self.stride,
            block_size: self.block_size.unwrap_or(defaults.block_size),
            clock_upper: self.clock_upper.or(defaults.clock_upper),
            convergence_margin: self
                .convergence_margin
                .unwrap_or(defaults.convergence_margin),
            checker_options: self
                .checker_options
                .clone()
                .unwrap_or_else(|| defaults.checker_options.clone()),
        };
        params.validate()?;
        Ok(params)
    }
}

/// A list of sweeps sharing one checker, renderer and results root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPlan {
    pub results_root: PathBuf,
    #[serde(default)]
    pub checker: CheckerConfig,
    pub renderer: RendererSpec,
    #[serde(default)]
    pub defaults: SweepDefaults,
    #[serde(default)]
    pub scheduler: Scheduler,
    pub sweeps: Vec<SweepEntry>,
}

impl BatchPlan {
    /// Parses a YAML plan. Relative paths stay as written.
    pub fn from_yaml_str(text: &str) -> Result<Self, PsnError> {
        serde_yaml::from_str(text)
            .map_err(|err| PsnError::Config(ErrorInfo::new("plan-parse", err.to_string())))
    }

    /// Reads a YAML plan from disk, resolving relative paths against its directory.
    pub fn load(path: &Path) -> Result<Self, PsnError> {
        let text = fs::read_to_string(path).map_err(|err| {
            PsnError::Config(ErrorInfo::new("plan-read", err.to_string()).with_path(path))
        })?;
        let mut plan = Self::from_yaml_str(&text).map_err(|err| match err {
            PsnError::Config(info) => PsnError::Config(info.with_path(path)),
            other => other,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        if plan.results_root.is_relative() {
            plan.results_root = base.join(&plan.results_root);
        }
        plan.renderer.rebase(base);
        Ok(plan)
    }

    /// Resolves every sweep, failing on the first invalid entry.
    pub fn resolve(&self) -> Result<Vec<SweepParams>, PsnError> {
        self.sweeps
            .iter()
            .enumerate()
            .map(|(idx, entry)| {
                entry.to_params(&self.defaults).map_err(|err| match err {
                    PsnError::InvalidRequest(info) => {
                        PsnError::InvalidRequest(info.with_context("sweep", idx.to_string()))
                    }
                    other => other,
                })
            })
            .collect()
    }
}
