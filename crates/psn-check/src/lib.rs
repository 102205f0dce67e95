//! Checker process invocation and report parsing.
//!
//! The checker is an opaque oracle: [`ModestInvoker`] runs it as a child
//! process and [`parse_report`] turns its free-text report into ordered
//! [`psn_core::ProbabilitySample`]s. Everything that depends on the report
//! format lives in [`report`].

pub mod config;
mod invoke;
mod locate;
mod process;
pub mod report;

pub use config::{CheckerConfig, DEFAULT_ERROR_MARKER, DEFAULT_EXECUTABLE};
pub use invoke::{
    CheckMode, Checker, CheckerOutput, ModelSource, ModestInvoker, SIMULATION_DEFAULTS,
};
pub use locate::resolve_executable;
pub use report::parse_report;
