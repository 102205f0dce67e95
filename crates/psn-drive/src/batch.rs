use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use psn_check::{Checker, ModestInvoker};
use psn_core::errors::{ErrorInfo, PsnError};
use psn_core::{format_elapsed, timed, SweepParams, Termination};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, info_span};

use crate::hash::{stable_hash_string, to_canonical_json_bytes};
use crate::plan::BatchPlan;
use crate::render::ModelRenderer;
use crate::schedule::run_sweep;
use crate::sink::{file_stem, persist, topology_dir};

/// Name of the report written next to the per-topology directories.
pub const BATCH_REPORT_FILE: &str = "batch_report.json";

/// Outcome of one sweep of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Converged,
    Exhausted,
    Failed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            JobStatus::Converged => "converged",
            JobStatus::Exhausted => "exhausted",
            JobStatus::Failed => "failed",
        })
    }
}

impl From<Termination> for JobStatus {
    fn from(termination: Termination) -> Self {
        match termination {
            Termination::Converged => JobStatus::Converged,
            Termination::Exhausted => JobStatus::Exhausted,
        }
    }
}

/// Summary for each sweep executed during a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchJobReport {
    pub stem: String,
    pub params: SweepParams,
    pub status: JobStatus,
    pub samples: usize,
    pub blocks: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_probability: Option<f64>,
    pub elapsed: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<PsnError>,
}

/// Aggregate batch report persisted for reproducibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub plan_hash: String,
    pub created_at: String,
    pub jobs: Vec<BatchJobReport>,
    #[serde(default)]
    pub metrics: Value,
}

impl BatchReport {
    pub fn failed(&self) -> impl Iterator<Item = &BatchJobReport> {
        self.jobs
            .iter()
            .filter(|job| job.status == JobStatus::Failed)
    }
}

/// Runs every sweep of `plan` with the configured checker and renderer.
///
/// A missing checker or an invalid sweep entry fails the whole batch before
/// any sweep starts. Errors inside a sweep are recorded in its job report.
pub fn run_batch(plan: &BatchPlan) -> Result<BatchReport, PsnError> {
    let checker = ModestInvoker::new(plan.checker.clone());
    let executable = checker.locate()?;
    info!(executable = %executable.display(), "checker located");
    let renderer = plan.renderer.build()?;
    run_batch_with(plan, renderer.as_ref(), &checker)
}

/// [`run_batch`] with caller-supplied renderer and checker.
pub fn run_batch_with<R, C>(
    plan: &BatchPlan,
    renderer: &R,
    checker: &C,
) -> Result<BatchReport, PsnError>
where
    R: ModelRenderer + Sync + ?Sized,
    C: Checker + Sync + ?Sized,
{
    let plan_hash = stable_hash_string(plan)?;
    let sweeps = plan.resolve()?;
    let root = plan.results_root.as_path();
    info!(
        sweeps = sweeps.len(),
        parallelism = plan.scheduler.parallelism,
        %plan_hash,
        "starting batch"
    );

    let (jobs, elapsed) = timed(|| -> Result<Vec<BatchJobReport>, PsnError> {
        if plan.scheduler.parallelism > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(plan.scheduler.parallelism)
                .build()
                .map_err(|err| PsnError::Config(ErrorInfo::new("thread-pool", err.to_string())))?;
            pool.install(|| {
                sweeps
                    .par_iter()
                    .enumerate()
                    .map(|(idx, params)| run_job(idx, params, root, renderer, checker))
                    .collect()
            })
        } else {
            sweeps
                .iter()
                .enumerate()
                .map(|(idx, params)| run_job(idx, params, root, renderer, checker))
                .collect()
        }
    });
    let jobs = jobs?;

    let count = |status: JobStatus| jobs.iter().filter(|job| job.status == status).count();
    let metrics = json!({
        "jobs": jobs.len(),
        "converged": count(JobStatus::Converged),
        "exhausted": count(JobStatus::Exhausted),
        "failed": count(JobStatus::Failed),
        "parallelism": plan.scheduler.parallelism,
        "elapsed": format_elapsed(elapsed),
    });

    Ok(BatchReport {
        plan_hash,
        created_at: Utc::now().to_rfc3339(),
        jobs,
        metrics,
    })
}

fn run_job<R, C>(
    idx: usize,
    params: &SweepParams,
    root: &Path,
    renderer: &R,
    checker: &C,
) -> Result<BatchJobReport, PsnError>
where
    R: ModelRenderer + ?Sized,
    C: Checker + ?Sized,
{
    let stem = file_stem(params)?;
    let span = info_span!("sweep", idx, %stem);
    let _guard = span.enter();

    let mut report = BatchJobReport {
        stem,
        params: params.clone(),
        status: JobStatus::Failed,
        samples: 0,
        blocks: 0,
        max_probability: None,
        elapsed: String::new(),
        data_path: None,
        timing_path: None,
        error: None,
    };

    match run_sweep(params, renderer, checker) {
        Ok(result) => {
            report.samples = result.samples.len();
            report.blocks = result.blocks.len();
            report.max_probability = result.max_probability();
            report.elapsed = format_elapsed(result.elapsed);
            match persist(&result, &topology_dir(root, params.topology_size)) {
                Ok(paths) => {
                    report.status = result
                        .termination
                        .map(JobStatus::from)
                        .unwrap_or(JobStatus::Failed);
                    report.data_path = Some(paths.data);
                    report.timing_path = Some(paths.timing);
                }
                Err(err) => {
                    error!(%err, "failed to persist sweep results");
                    report.error = Some(err);
                }
            }
        }
        Err(failure) => {
            error!(error = %failure.error, blocks = failure.partial.blocks.len(), "sweep failed");
            report.samples = failure.partial.samples.len();
            report.blocks = failure.partial.blocks.len();
            report.max_probability = failure.partial.max_probability();
            report.elapsed = format_elapsed(failure.partial.elapsed);
            report.error = Some(failure.error);
        }
    }
    Ok(report)
}

/// Writes `report` as canonical JSON into `dir` and returns the file path.
pub fn persist_report(dir: &Path, report: &BatchReport) -> Result<PathBuf, PsnError> {
    fs::create_dir_all(dir).map_err(|err| PsnError::io("report-mkdir", err, dir))?;
    let path = dir.join(BATCH_REPORT_FILE);
    let bytes = to_canonical_json_bytes(report)?;
    fs::write(&path, bytes).map_err(|err| PsnError::io("report-write", err, &path))?;
    Ok(path)
}
