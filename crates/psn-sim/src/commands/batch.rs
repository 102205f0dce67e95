use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use psn_drive::{persist_report, run_batch, BatchPlan};

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// YAML batch plan.
    #[arg(long)]
    pub plan: PathBuf,
    /// Directory for `batch_report.json`. Defaults to the plan's results root.
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Override the plan's scheduler parallelism.
    #[arg(long)]
    pub parallelism: Option<usize>,
}

pub fn run(args: &BatchArgs) -> Result<(), Box<dyn Error>> {
    let mut plan = BatchPlan::load(&args.plan)?;
    if let Some(parallelism) = args.parallelism {
        plan.scheduler.parallelism = parallelism;
    }
    let report = run_batch(&plan)?;
    let out = args.out.clone().unwrap_or_else(|| plan.results_root.clone());
    let path = persist_report(&out, &report)?;

    for job in &report.jobs {
        println!(
            "{:<9} {} ({} samples, {})",
            job.status,
            job.stem,
            job.samples,
            job.elapsed
        );
    }
    println!("report: {}", path.display());

    let failed = report.failed().count();
    if failed > 0 {
        return Err(format!("{failed} of {} sweeps failed", report.jobs.len()).into());
    }
    Ok(())
}
