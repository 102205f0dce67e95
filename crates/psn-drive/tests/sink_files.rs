use std::fs;
use std::time::Duration;

use psn_core::{NoiseKind, ProbabilitySample, PsnError, RunResult, SweepParams, Termination};
use psn_drive::{file_stem, load_series, persist, render_summary, topology_dir, write_series};
use tempfile::tempdir;

fn sample_result() -> RunResult {
    let mut params = SweepParams::new(4, NoiseKind::Inductive, 10, 2);
    params.clock_upper = Some(299);
    let mut result = RunResult::empty(params);
    result.samples = vec![
        ProbabilitySample::new(0, 0.1),
        ProbabilitySample::new(50, 0.4),
        ProbabilitySample::new(100, 0.91),
    ];
    result.termination = Some(Termination::Exhausted);
    result.elapsed = Duration::from_millis(3_723_450);
    result
}

#[test]
fn series_round_trips_exactly() {
    let dir = tempdir().unwrap();
    let result = sample_result();
    let paths = persist(&result, dir.path()).unwrap();

    assert_eq!(load_series(&paths.data).unwrap(), result.samples);
    let raw = fs::read_to_string(&paths.data).unwrap();
    assert_eq!(raw, "Clock Cycle,Probability\n0,0.1\n50,0.4\n100,0.91\n");
}

#[test]
fn files_are_named_after_parameters() {
    let root = tempdir().unwrap();
    let result = sample_result();
    let dir = topology_dir(root.path(), 4);
    let paths = persist(&result, &dir).unwrap();

    let stem = "noc_4x4_inductive_noise_threshold_10_stride_2_block_size_100";
    assert_eq!(file_stem(&result.params).unwrap(), stem);
    assert_eq!(paths.data, root.path().join("4x4").join(format!("{stem}.csv")));
    assert_eq!(paths.timing, root.path().join("4x4").join(format!("{stem}.time.txt")));
    assert!(paths.timing.is_file());
}

#[test]
fn existing_directory_is_reused() {
    let dir = tempdir().unwrap();
    let result = sample_result();
    persist(&result, dir.path()).unwrap();
    let paths = persist(&result, dir.path()).unwrap();
    assert_eq!(load_series(&paths.data).unwrap().len(), 3);
}

#[test]
fn timing_file_lists_parameters_and_elapsed_time() {
    let summary = render_summary(&sample_result()).unwrap();
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Simulation parameters:",
            "  Size: 4x4",
            "  Noise Type: INDUCTIVE",
            "  Clock Upper Bound: 299",
            "  Threshold: 10",
            "  Stride: 2",
            "  Block Size: 50",
            "  Effective Block Size: 100",
            "",
            "Termination: exhausted",
            "Blocks: 0",
            "Samples: 3",
            "Max Probability: 0.91",
            "Elapsed time: 01:02:03.45",
        ]
    );
}

#[test]
fn unbounded_sweep_reports_no_upper_bound() {
    let mut result = sample_result();
    result.params.clock_upper = None;
    let summary = render_summary(&result).unwrap();
    assert!(summary.contains("\n  Clock Upper Bound: None\n"));
}

#[test]
fn empty_series_writes_header_only() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.csv");
    write_series(&[], &path).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "Clock Cycle,Probability\n");
    assert!(load_series(&path).unwrap().is_empty());
}

#[test]
fn foreign_header_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("other.csv");
    fs::write(&path, "cycle,p\n1,0.5\n").unwrap();
    let err = load_series(&path).unwrap_err();
    assert!(matches!(err, PsnError::Io(_)));
    assert_eq!(err.info().code, "series-header");
}

#[test]
fn unwritable_directory_is_an_io_error() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "").unwrap();
    let err = persist(&sample_result(), &blocker.join("nested")).unwrap_err();
    assert_eq!(err.info().code, "results-mkdir");
}
