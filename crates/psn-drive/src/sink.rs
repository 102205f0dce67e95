//! Persistence of sweep results: a CSV probability series and a timing summary.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use psn_core::errors::{ErrorInfo, PsnError};
use psn_core::{format_elapsed, ProbabilitySample, RunResult, SweepParams};
use tracing::info;

/// Column names of the data file header.
pub const SERIES_HEADER: [&str; 2] = ["Clock Cycle", "Probability"];

/// Paths written by [`persist`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedPaths {
    pub timing: PathBuf,
    pub data: PathBuf,
}

fn csv_error(code: &str, err: impl ToString, path: &Path) -> PsnError {
    PsnError::Io(ErrorInfo::new(code, err.to_string()).with_path(path))
}

/// Filename stem identifying a sweep by its parameters.
pub fn file_stem(params: &SweepParams) -> Result<String, PsnError> {
    Ok(format!(
        "noc_{n}x{n}_{kind}_noise_threshold_{threshold}_stride_{stride}_block_size_{effective}",
        n = params.topology_size,
        kind = params.noise_kind.slug(),
        threshold = params.threshold,
        stride = params.stride,
        effective = params.effective_block_size()?,
    ))
}

/// `{root}/{n}x{n}`, the per-topology results directory.
pub fn topology_dir(root: &Path, topology_size: u32) -> PathBuf {
    root.join(format!("{topology_size}x{topology_size}"))
}

/// Writes the data and timing files for `result` into `dir`.
///
/// `dir` is created when missing. Existing files with the same stem are
/// overwritten.
pub fn persist(result: &RunResult, dir: &Path) -> Result<PersistedPaths, PsnError> {
    fs::create_dir_all(dir).map_err(|err| PsnError::io("results-mkdir", err, dir))?;
    let stem = file_stem(&result.params)?;
    let data = dir.join(format!("{stem}.csv"));
    let timing = dir.join(format!("{stem}.time.txt"));

    write_series(&result.samples, &data)?;
    fs::write(&timing, render_summary(result)?)
        .map_err(|err| PsnError::io("timing-write", err, &timing))?;

    info!(data = %data.display(), timing = %timing.display(), "results written");
    Ok(PersistedPaths { timing, data })
}

/// Writes `samples` as a two-column CSV with a header record.
pub fn write_series(samples: &[ProbabilitySample], path: &Path) -> Result<(), PsnError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|err| csv_error("series-open", err, path))?;
    wtr.write_record(SERIES_HEADER)
        .map_err(|err| csv_error("series-write", err, path))?;
    for sample in samples {
        wtr.write_record([sample.cycle.to_string(), sample.probability.to_string()])
            .map_err(|err| csv_error("series-write", err, path))?;
    }
    wtr.flush().map_err(|err| PsnError::io("series-flush", err, path))
}

/// Reads a data file written by [`write_series`].
pub fn load_series(path: &Path) -> Result<Vec<ProbabilitySample>, PsnError> {
    let mut rdr = csv::Reader::from_path(path).map_err(|err| csv_error("series-open", err, path))?;
    let headers = rdr
        .headers()
        .map_err(|err| csv_error("series-read", err, path))?;
    if headers.iter().ne(SERIES_HEADER) {
        return Err(PsnError::Io(
            ErrorInfo::new("series-header", "unexpected data file header")
                .with_path(path)
                .with_context("found", headers.iter().collect::<Vec<_>>().join(",")),
        ));
    }

    let mut samples = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        let record = record.map_err(|err| csv_error("series-read", err, path))?;
        let field = |col: usize| record.get(col).unwrap_or_default().trim();
        let row_error = |err: String| {
            PsnError::Io(
                ErrorInfo::new("series-row", err)
                    .with_path(path)
                    .with_context("row", (idx + 1).to_string()),
            )
        };
        let cycle = field(0)
            .parse::<u64>()
            .map_err(|err| row_error(err.to_string()))?;
        let probability = field(1)
            .parse::<f64>()
            .map_err(|err| row_error(err.to_string()))?;
        samples.push(ProbabilitySample::new(cycle, probability));
    }
    Ok(samples)
}

/// Parameter block shared by the timing file and CLI output.
pub fn parameter_summary(params: &SweepParams) -> Result<String, PsnError> {
    let n = params.topology_size;
    let clock_upper = params
        .clock_upper
        .map(|upper| upper.to_string())
        .unwrap_or_else(|| "None".to_string());
    let mut text = String::from("Simulation parameters:\n");
    // Writing into a String cannot fail.
    let _ = writeln!(text, "  Size: {n}x{n}");
    let _ = writeln!(text, "  Noise Type: {}", params.noise_kind);
    let _ = writeln!(text, "  Clock Upper Bound: {clock_upper}");
    let _ = writeln!(text, "  Threshold: {}", params.threshold);
    let _ = writeln!(text, "  Stride: {}", params.stride);
    let _ = writeln!(text, "  Block Size: {}", params.block_size);
    let effective = params.effective_block_size()?;
    let _ = writeln!(text, "  Effective Block Size: {effective}");
    Ok(text)
}

/// Full timing file contents for `result`.
pub fn render_summary(result: &RunResult) -> Result<String, PsnError> {
    let mut text = parameter_summary(&result.params)?;
    text.push('\n');
    let termination = result
        .termination
        .map(|t| t.to_string())
        .unwrap_or_else(|| "aborted".to_string());
    let _ = writeln!(text, "Termination: {termination}");
    let _ = writeln!(text, "Blocks: {}", result.blocks.len());
    let _ = writeln!(text, "Samples: {}", result.samples.len());
    if let Some(pmax) = result.max_probability() {
        let _ = writeln!(text, "Max Probability: {pmax}");
    }
    let _ = writeln!(text, "Elapsed time: {}", format_elapsed(result.elapsed));
    Ok(text)
}
