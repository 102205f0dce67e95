use std::fs;

use psn_core::NoiseKind;
use psn_drive::{
    load_series, persist_report, run_batch, run_batch_with, BatchPlan, BatchReport, JobStatus,
    RendererSpec, SweepDefaults, SweepEntry, BATCH_REPORT_FILE,
};
use tempfile::tempdir;

mod fixtures;

use fixtures::{checker_failure, range_renderer, report, FakeChecker};

fn plan(root: &std::path::Path, parallelism: usize) -> BatchPlan {
    BatchPlan {
        results_root: root.to_path_buf(),
        checker: Default::default(),
        renderer: RendererSpec::Command {
            program: "unused".into(),
            args: vec![],
        },
        defaults: SweepDefaults {
            clock_upper: Some(99),
            ..SweepDefaults::default()
        },
        scheduler: psn_drive::Scheduler { parallelism },
        sweeps: vec![
            SweepEntry::new(2, NoiseKind::Resistive, 1, 1),
            // The fake checker fails every block of this stride.
            SweepEntry::new(3, NoiseKind::Resistive, 5, 7),
            SweepEntry::new(4, NoiseKind::Inductive, 10, 1),
        ],
    }
}

fn checker() -> FakeChecker {
    FakeChecker::with_responder(|_, lower, upper, stride| {
        if stride == 7 {
            return Err(checker_failure());
        }
        Ok(report((lower..=upper).map(|cycle| (cycle, cycle as f64 / 1000.0))))
    })
}

fn assert_report(report: &BatchReport, root: &std::path::Path) {
    let statuses: Vec<JobStatus> = report.jobs.iter().map(|job| job.status).collect();
    assert_eq!(
        statuses,
        vec![JobStatus::Exhausted, JobStatus::Failed, JobStatus::Exhausted]
    );
    assert_eq!(report.metrics["failed"], 1);
    assert_eq!(report.metrics["exhausted"], 2);

    let failed = &report.jobs[1];
    assert_eq!(failed.error.as_ref().unwrap().info().code, "checker-spawn");
    assert!(failed.data_path.is_none());
    assert!(!root.join("3x3").exists());

    let first = &report.jobs[0];
    let data = first.data_path.as_ref().unwrap();
    assert!(data.starts_with(root.join("2x2")));
    assert_eq!(load_series(data).unwrap().len(), 100);
    assert_eq!(first.max_probability, Some(0.099));
    assert!(report.jobs[2].timing_path.as_ref().unwrap().is_file());
}

#[test]
fn failed_sweep_does_not_stop_the_batch() {
    let root = tempdir().unwrap();
    let plan = plan(root.path(), 1);
    let report = run_batch_with(&plan, &range_renderer, &checker()).unwrap();
    assert_report(&report, root.path());
    assert_eq!(report.failed().count(), 1);
}

#[test]
fn parallel_batch_keeps_plan_order() {
    let root = tempdir().unwrap();
    let plan = plan(root.path(), 3);
    let report = run_batch_with(&plan, &range_renderer, &checker()).unwrap();
    assert_report(&report, root.path());
    assert_eq!(report.metrics["parallelism"], 3);
}

#[test]
fn report_is_written_as_json() {
    let root = tempdir().unwrap();
    let plan = plan(root.path(), 1);
    let report = run_batch_with(&plan, &range_renderer, &checker()).unwrap();
    let path = persist_report(root.path(), &report).unwrap();

    assert_eq!(path, root.path().join(BATCH_REPORT_FILE));
    let restored: BatchReport = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    assert_eq!(restored.plan_hash, report.plan_hash);
    assert_eq!(restored.jobs.len(), 3);
    assert_eq!(restored.jobs[1].error, report.jobs[1].error);
    assert_eq!(restored.jobs[2].data_path, report.jobs[2].data_path);
}

#[test]
fn missing_checker_fails_before_any_sweep() {
    let root = tempdir().unwrap();
    let mut plan = plan(root.path(), 1);
    plan.checker.executable = "modest-not-installed".into();
    plan.checker.search_path = Some(root.path().display().to_string());

    let err = run_batch(&plan).unwrap_err();
    assert_eq!(err.info().code, "checker-missing");
    assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
}
