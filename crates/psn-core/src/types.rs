use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, PsnError};

/// Nominal number of modelled cycles per checker invocation.
pub const DEFAULT_BLOCK_SIZE: u64 = 50;

/// Distance from certainty at which a sweep is considered converged.
///
/// Absorbs estimation noise in the checker's reported probabilities.
pub const DEFAULT_CONVERGENCE_MARGIN: f64 = 1e-5;

/// Kind of power-supply noise a property measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseKind {
    /// IR-drop style noise driven by simultaneous switching current.
    Resistive,
    /// di/dt style noise driven by current changes between cycles.
    Inductive,
}

impl NoiseKind {
    /// Upper-case label used in summaries (`RESISTIVE`).
    pub fn label(&self) -> &'static str {
        match self {
            NoiseKind::Resistive => "RESISTIVE",
            NoiseKind::Inductive => "INDUCTIVE",
        }
    }

    /// Lower-case slug used in filenames and renderer arguments.
    pub fn slug(&self) -> &'static str {
        match self {
            NoiseKind::Resistive => "resistive",
            NoiseKind::Inductive => "inductive",
        }
    }
}

impl fmt::Display for NoiseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for NoiseKind {
    type Err = PsnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "resistive" => Ok(NoiseKind::Resistive),
            "inductive" => Ok(NoiseKind::Inductive),
            other => Err(PsnError::InvalidRequest(
                ErrorInfo::new("noise-kind", format!("unknown noise kind `{other}`"))
                    .with_hint("expected `resistive` or `inductive`"),
            )),
        }
    }
}

/// One estimated probability for a bounded-reward property.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbabilitySample {
    /// Clock-cycle bound encoded in the property name.
    pub cycle: u64,
    /// Estimated probability reported by the checker.
    pub probability: f64,
}

impl ProbabilitySample {
    /// Creates a sample for the given cycle bound.
    pub fn new(cycle: u64, probability: f64) -> Self {
        Self { cycle, probability }
    }
}

/// Parameters selecting and bounding one block of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationRequest {
    topology_size: u32,
    noise_kind: NoiseKind,
    clock_low: u64,
    clock_high: u64,
    stride: u64,
    threshold: u32,
}

impl SimulationRequest {
    /// Validates and builds a request for the inclusive range `[clock_low, clock_high]`.
    pub fn new(
        topology_size: u32,
        noise_kind: NoiseKind,
        clock_low: u64,
        clock_high: u64,
        stride: u64,
        threshold: u32,
    ) -> Result<Self, PsnError> {
        if clock_low > clock_high {
            return Err(PsnError::InvalidRequest(
                ErrorInfo::new("clock-range", "clock_low exceeds clock_high")
                    .with_context("clock_low", clock_low.to_string())
                    .with_context("clock_high", clock_high.to_string()),
            ));
        }
        if stride == 0 {
            return Err(PsnError::invalid("stride", "stride must be at least 1"));
        }
        if topology_size == 0 {
            return Err(PsnError::invalid(
                "topology-size",
                "topology size must be at least 1",
            ));
        }
        Ok(Self {
            topology_size,
            noise_kind,
            clock_low,
            clock_high,
            stride,
            threshold,
        })
    }

    pub fn topology_size(&self) -> u32 {
        self.topology_size
    }

    pub fn noise_kind(&self) -> NoiseKind {
        self.noise_kind
    }

    pub fn clock_low(&self) -> u64 {
        self.clock_low
    }

    pub fn clock_high(&self) -> u64 {
        self.clock_high
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}

/// Identifying parameters of one sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepParams {
    /// Edge length of the square mesh (`n` for an `n x n` NoC).
    pub topology_size: u32,
    /// Noise kind whose property is being estimated.
    pub noise_kind: NoiseKind,
    /// Noise threshold forwarded to the model renderer.
    pub threshold: u32,
    /// Only every `stride`-th cycle is modelled.
    pub stride: u64,
    /// Nominal block size in modelled points; scaled by `stride` per invocation.
    pub block_size: u64,
    /// Last cycle to simulate; `None` sweeps until convergence.
    pub clock_upper: Option<u64>,
    /// Convergence margin below 1.0.
    pub convergence_margin: f64,
    /// Extra checker flags appended after the simulation defaults.
    pub checker_options: Vec<String>,
}

impl SweepParams {
    /// Creates parameters with the default block size, no clock bound and
    /// the default convergence margin.
    pub fn new(topology_size: u32, noise_kind: NoiseKind, threshold: u32, stride: u64) -> Self {
        Self {
            topology_size,
            noise_kind,
            threshold,
            stride,
            block_size: DEFAULT_BLOCK_SIZE,
            clock_upper: None,
            convergence_margin: DEFAULT_CONVERGENCE_MARGIN,
            checker_options: Vec::new(),
        }
    }

    /// Rejects parameter sets that cannot drive a sweep.
    pub fn validate(&self) -> Result<(), PsnError> {
        if self.topology_size == 0 {
            return Err(PsnError::invalid(
                "topology-size",
                "topology size must be at least 1",
            ));
        }
        if self.stride == 0 {
            return Err(PsnError::invalid("stride", "stride must be at least 1"));
        }
        if self.block_size == 0 {
            return Err(PsnError::invalid(
                "block-size",
                "block size must be at least 1",
            ));
        }
        if !(self.convergence_margin > 0.0 && self.convergence_margin < 1.0) {
            return Err(PsnError::InvalidRequest(
                ErrorInfo::new("convergence-margin", "margin must lie strictly within (0, 1)")
                    .with_context("margin", self.convergence_margin.to_string()),
            ));
        }
        self.effective_block_size().map(|_| ())
    }

    /// Cycles spanned by one invocation: `block_size * stride`.
    pub fn effective_block_size(&self) -> Result<u64, PsnError> {
        self.block_size.checked_mul(self.stride).ok_or_else(|| {
            PsnError::InvalidRequest(
                ErrorInfo::new("block-size", "block_size * stride overflows")
                    .with_context("block_size", self.block_size.to_string())
                    .with_context("stride", self.stride.to_string()),
            )
        })
    }

    /// Probability at or below which the sweep keeps advancing.
    pub fn convergence_floor(&self) -> f64 {
        1.0 - self.convergence_margin
    }
}

/// Terminal state reached by a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Termination {
    /// The running maximum probability came within the margin of 1.0.
    Converged,
    /// The explicit clock upper bound was reached first.
    Exhausted,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Converged => f.write_str("converged"),
            Termination::Exhausted => f.write_str("exhausted"),
        }
    }
}

/// Bookkeeping for one checker invocation within a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub lower: u64,
    pub upper: u64,
    pub samples: usize,
    /// Running maximum over the whole series after this block.
    pub running_max: Option<f64>,
}

/// Ordered probability series produced by one sweep, plus provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub params: SweepParams,
    pub samples: Vec<ProbabilitySample>,
    pub blocks: Vec<BlockRecord>,
    /// `None` when the sweep was aborted by an error.
    pub termination: Option<Termination>,
    pub elapsed: Duration,
}

impl RunResult {
    /// Empty result for a sweep that has not processed any block yet.
    pub fn empty(params: SweepParams) -> Self {
        Self {
            params,
            samples: Vec::new(),
            blocks: Vec::new(),
            termination: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Maximum probability across the whole series.
    pub fn max_probability(&self) -> Option<f64> {
        running_max(&self.samples)
    }
}

/// Maximum probability across `samples`, `None` when empty.
pub fn running_max(samples: &[ProbabilitySample]) -> Option<f64> {
    samples
        .iter()
        .map(|sample| sample.probability)
        .fold(None, |acc, p| match acc {
            Some(current) if current >= p => Some(current),
            _ => Some(p),
        })
}
