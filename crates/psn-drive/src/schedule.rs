use psn_check::{parse_report, Checker, CheckerOutput, ModelSource};
use psn_core::errors::{ErrorInfo, PsnError};
use psn_core::{
    running_max, BlockRecord, ProbabilitySample, RunResult, SimulationRequest, Stopwatch,
    SweepParams, Termination,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::render::ModelRenderer;

/// Control state of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepState {
    /// More blocks remain.
    Advancing,
    /// Terminal: the running maximum came within the margin of 1.0.
    Converged,
    /// Terminal: the clock upper bound was reached first.
    Exhausted,
}

impl SweepState {
    pub fn termination(&self) -> Option<Termination> {
        match self {
            SweepState::Advancing => None,
            SweepState::Converged => Some(Termination::Converged),
            SweepState::Exhausted => Some(Termination::Exhausted),
        }
    }
}

/// Walks the clock-cycle axis in contiguous, non-overlapping blocks.
#[derive(Debug, Clone)]
pub struct BlockScheduler {
    effective_block_size: u64,
    clock_upper: Option<u64>,
    convergence_floor: f64,
    lower: u64,
    state: SweepState,
}

impl BlockScheduler {
    /// Validates `params` and positions the scheduler at cycle 0.
    pub fn new(params: &SweepParams) -> Result<Self, PsnError> {
        params.validate()?;
        Ok(Self {
            effective_block_size: params.effective_block_size()?,
            clock_upper: params.clock_upper,
            convergence_floor: params.convergence_floor(),
            lower: 0,
            state: SweepState::Advancing,
        })
    }

    pub fn state(&self) -> SweepState {
        self.state
    }

    /// Inclusive range of the next block, or `None` once terminal.
    pub fn next_range(&self) -> Option<(u64, u64)> {
        if self.state != SweepState::Advancing {
            return None;
        }
        let mut upper = self
            .lower
            .saturating_add(self.effective_block_size - 1);
        if let Some(limit) = self.clock_upper {
            upper = upper.min(limit);
        }
        Some((self.lower, upper))
    }

    /// Folds in the outcome of the block ending at `upper`.
    ///
    /// `pmax` is the maximum probability over the whole series so far.
    pub fn record(&mut self, upper: u64, pmax: Option<f64>) -> SweepState {
        if self.state != SweepState::Advancing {
            return self.state;
        }
        if pmax.is_some_and(|p| p > self.convergence_floor) {
            self.state = SweepState::Converged;
            return self.state;
        }
        let more = match self.clock_upper {
            Some(limit) => upper < limit,
            None => true,
        };
        self.state = match self.lower.checked_add(self.effective_block_size) {
            Some(next) if more => {
                self.lower = next;
                SweepState::Advancing
            }
            _ => SweepState::Exhausted,
        };
        self.state
    }
}

/// A sweep aborted by an error, with everything gathered before it.
#[derive(Debug, Error)]
#[error("sweep aborted after {blocks} block(s): {error}", blocks = .partial.blocks.len())]
pub struct SweepFailure {
    #[source]
    pub error: PsnError,
    pub partial: Box<RunResult>,
}

/// Runs one sweep to convergence or exhaustion.
///
/// Each block is rendered, simulated and parsed in turn. An unavailable
/// checker fails the sweep before anything is rendered. Any renderer or
/// checker error, including output carrying the checker's error marker,
/// aborts the sweep without retrying; the samples collected up to that point
/// are returned inside the [`SweepFailure`].
pub fn run_sweep<R, C>(
    params: &SweepParams,
    renderer: &R,
    checker: &C,
) -> Result<RunResult, SweepFailure>
where
    R: ModelRenderer + ?Sized,
    C: Checker + ?Sized,
{
    let watch = Stopwatch::start();
    let mut result = RunResult::empty(params.clone());
    let fail = |error: PsnError, mut partial: RunResult| {
        partial.elapsed = watch.elapsed();
        SweepFailure {
            error,
            partial: Box::new(partial),
        }
    };

    let mut scheduler = match BlockScheduler::new(params) {
        Ok(scheduler) => scheduler,
        Err(error) => return Err(fail(error, result)),
    };
    if !checker.is_available() {
        let error = PsnError::ExternalToolMissing(
            ErrorInfo::new("checker-missing", "checker is not available")
                .with_hint("install the checker or set `executable` to its full path"),
        );
        return Err(fail(error, result));
    }
    let mut pmax: Option<f64> = None;

    while let Some((lower, upper)) = scheduler.next_range() {
        let block = match simulate_block(params, lower, upper, renderer, checker) {
            Ok(block) => block,
            Err(error) => return Err(fail(error, result)),
        };
        if block.is_empty() {
            warn!(lower, upper, "block yielded no samples");
        }
        pmax = match (pmax, running_max(&block)) {
            (Some(current), Some(candidate)) => Some(current.max(candidate)),
            (current, candidate) => current.or(candidate),
        };
        log_progress(lower, upper, &block, pmax);

        result.blocks.push(BlockRecord {
            lower,
            upper,
            samples: block.len(),
            running_max: pmax,
        });
        result.samples.extend(block);
        scheduler.record(upper, pmax);
    }

    result.termination = scheduler.state().termination();
    result.elapsed = watch.elapsed();
    info!(
        termination = ?result.termination,
        samples = result.samples.len(),
        elapsed = %psn_core::format_elapsed(result.elapsed),
        "sweep finished"
    );
    Ok(result)
}

fn simulate_block<R, C>(
    params: &SweepParams,
    lower: u64,
    upper: u64,
    renderer: &R,
    checker: &C,
) -> Result<Vec<ProbabilitySample>, PsnError>
where
    R: ModelRenderer + ?Sized,
    C: Checker + ?Sized,
{
    let request = SimulationRequest::new(
        params.topology_size,
        params.noise_kind,
        lower,
        upper,
        params.stride,
        params.threshold,
    )?;
    let model = renderer.render(&request)?;
    let output = checker.simulate(&ModelSource::Inline(model), &params.checker_options)?;
    if output.reported_error {
        return Err(reported_error(&output, lower, upper));
    }
    Ok(parse_report(&output.text))
}

fn reported_error(output: &CheckerOutput, lower: u64, upper: u64) -> PsnError {
    let message = output
        .text
        .lines()
        .map(str::trim)
        .find(|line| line.contains("error"))
        .unwrap_or("checker reported an error");
    let mut info = ErrorInfo::new("checker-reported-error", message)
        .with_context("lower", lower.to_string())
        .with_context("upper", upper.to_string());
    if let Some(model) = &output.retained_model {
        info = info
            .with_context("model", model.display().to_string())
            .with_hint("the rendered model was kept for inspection");
    }
    PsnError::ProcessInvocation(info)
}

fn log_progress(lower: u64, upper: u64, block: &[ProbabilitySample], pmax: Option<f64>) {
    let head = preview(block.iter().take(3));
    let tail = preview(block.iter().skip(block.len().saturating_sub(3)));
    info!(
        "finished clock cycle block ({lower},{upper}). P: [{head}...{tail}]. Pmax: {}",
        pmax.map(|p| format!("{p:.3}")).unwrap_or_else(|| "n/a".to_string())
    );
}

fn preview<'a>(samples: impl Iterator<Item = &'a ProbabilitySample>) -> String {
    samples
        .map(|sample| format!("{:.3}", sample.probability))
        .collect::<Vec<_>>()
        .join(", ")
}
