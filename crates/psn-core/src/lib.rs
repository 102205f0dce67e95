#![doc = "Core data types, structured errors and timing helpers for the PSN sweep driver."]

pub mod errors;
pub mod timing;
mod types;

pub use errors::{ErrorInfo, PsnError};
pub use timing::{format_elapsed, timed, Stopwatch};
pub use types::{
    running_max, BlockRecord, NoiseKind, ProbabilitySample, RunResult, SimulationRequest,
    SweepParams, Termination, DEFAULT_BLOCK_SIZE, DEFAULT_CONVERGENCE_MARGIN,
};
