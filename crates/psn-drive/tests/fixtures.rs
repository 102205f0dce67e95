#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Mutex;

use psn_check::{CheckMode, Checker, CheckerOutput, ModelSource};
use psn_core::{ErrorInfo, PsnError, SimulationRequest};

/// Model text understood by [`FakeChecker`]: `lower upper stride`.
pub fn range_renderer(request: &SimulationRequest) -> Result<String, PsnError> {
    Ok(format!(
        "{} {} {}",
        request.clock_low(),
        request.clock_high(),
        request.stride()
    ))
}

/// One checker call as seen by [`FakeChecker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub mode: CheckMode,
    pub lower: u64,
    pub upper: u64,
    pub options: Vec<String>,
}

/// Output fragment treated as an error report, as the real checker does.
pub const ERROR_MARKER: &str = "error:";

type Responder = dyn Fn(usize, u64, u64, u64) -> Result<String, PsnError> + Send + Sync;

/// In-process checker that emits a report for every modelled point of a block.
pub struct FakeChecker {
    respond: Box<Responder>,
    calls: Mutex<Vec<Call>>,
    available: bool,
}

impl FakeChecker {
    /// Reports `curve(cycle)` for each point, newest first to exercise sorting.
    pub fn with_curve(curve: impl Fn(u64) -> f64 + Send + Sync + 'static) -> Self {
        Self::with_responder(move |_, lower, upper, stride| {
            let mut cycles: Vec<u64> = (lower..=upper).step_by(stride as usize).collect();
            cycles.reverse();
            Ok(report(cycles.into_iter().map(|cycle| (cycle, curve(cycle)))))
        })
    }

    pub fn with_responder(
        respond: impl Fn(usize, u64, u64, u64) -> Result<String, PsnError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            respond: Box::new(respond),
            calls: Mutex::new(Vec::new()),
            available: true,
        }
    }

    /// A checker whose executable cannot be found.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::with_curve(|_| 0.0)
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl Checker for FakeChecker {
    fn is_available(&self) -> bool {
        self.available
    }

    fn invoke(
        &self,
        mode: CheckMode,
        model: &ModelSource,
        options: &[String],
    ) -> Result<CheckerOutput, PsnError> {
        let ModelSource::Inline(text) = model else {
            panic!("driver must pass inline models");
        };
        let fields: Vec<u64> = text
            .split_whitespace()
            .map(|field| field.parse().unwrap())
            .collect();
        let (lower, upper, stride) = (fields[0], fields[1], fields[2]);
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Call {
                mode,
                lower,
                upper,
                options: options.to_vec(),
            });
            calls.len() - 1
        };
        let text = (self.respond)(call, lower, upper, stride)?;
        let reported_error = text.contains(ERROR_MARKER);
        Ok(CheckerOutput {
            retained_model: reported_error.then(|| retained_path(call)),
            reported_error,
            text,
            exit_code: Some(0),
        })
    }
}

/// Where [`FakeChecker`] claims to have kept the model of call `call`.
pub fn retained_path(call: usize) -> PathBuf {
    PathBuf::from(format!("/tmp/psn-scratch/psn-model-{call}.modest"))
}

/// Checker report text for `(cycle, probability)` pairs.
pub fn report(points: impl IntoIterator<Item = (u64, f64)>) -> String {
    let mut text = String::from("Simulating noc.modest\n");
    for (cycle, probability) in points {
        text.push_str(&format!(
            "+ Property NocProbabilityRewardBounded{cycle}\n  Estimated probability: {probability}\n"
        ));
    }
    text
}

pub fn checker_failure() -> PsnError {
    PsnError::ProcessInvocation(ErrorInfo::new("checker-spawn", "No such file or directory"))
}
