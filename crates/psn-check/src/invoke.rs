use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use psn_core::errors::{ErrorInfo, PsnError};
use tempfile::TempPath;
use tracing::{debug, warn};

use crate::config::CheckerConfig;
use crate::locate::resolve_executable;
use crate::process::{run_captured, Captured, RunError};

/// Flags always passed in simulation mode: no run-length cap, best-effort execution.
pub const SIMULATION_DEFAULTS: [&str; 3] = ["--max-run-length", "0", "--unsafe"];

/// Checker subcommand selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMode {
    /// Exhaustive correctness check.
    Check,
    /// Statistical simulation.
    Simulate,
}

impl CheckMode {
    pub fn subcommand(&self) -> &'static str {
        match self {
            CheckMode::Check => "check",
            CheckMode::Simulate => "simulate",
        }
    }

    /// Flags inserted before caller-supplied options.
    pub fn default_options(&self) -> &'static [&'static str] {
        match self {
            CheckMode::Check => &[],
            CheckMode::Simulate => &SIMULATION_DEFAULTS,
        }
    }
}

/// Model program handed to the checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// Program text; staged to a temporary file for the call.
    Inline(String),
    /// Existing file, used in place and never deleted.
    File(PathBuf),
}

impl ModelSource {
    /// Treats `text` as a path when it names an existing file, as program text otherwise.
    pub fn from_text_or_path(text: impl Into<String>) -> Self {
        let text = text.into();
        if Path::new(&text).is_file() {
            ModelSource::File(PathBuf::from(text))
        } else {
            ModelSource::Inline(text)
        }
    }
}

/// Captured result of one checker invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerOutput {
    /// Trimmed stdout followed by trimmed stderr.
    pub text: String,
    /// Exit code, when the process exited normally. Not interpreted.
    pub exit_code: Option<i32>,
    /// Whether the output contains the configured error marker.
    pub reported_error: bool,
    /// Temporary model kept because the output reported an error.
    pub retained_model: Option<PathBuf>,
}

impl CheckerOutput {
    pub fn contains(&self, marker: &str) -> bool {
        self.text.contains(marker)
    }

    /// Writes the raw output to `path`, creating parent directories.
    pub fn write_transcript(&self, path: &Path) -> Result<(), PsnError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| PsnError::io("transcript-mkdir", err, parent))?;
        }
        fs::write(path, &self.text).map_err(|err| PsnError::io("transcript-write", err, path))
    }
}

/// Anything able to run a model through the checker.
pub trait Checker {
    /// Runs `model` in `mode`, appending `options` after the mode defaults.
    fn invoke(
        &self,
        mode: CheckMode,
        model: &ModelSource,
        options: &[String],
    ) -> Result<CheckerOutput, PsnError>;

    /// Whether the checker can be invoked at all. Callers consult this before
    /// doing any per-call work such as rendering a model.
    fn is_available(&self) -> bool {
        true
    }

    fn check(&self, model: &ModelSource, options: &[String]) -> Result<CheckerOutput, PsnError> {
        self.invoke(CheckMode::Check, model, options)
    }

    fn simulate(&self, model: &ModelSource, options: &[String]) -> Result<CheckerOutput, PsnError> {
        self.invoke(CheckMode::Simulate, model, options)
    }
}

/// Subprocess-backed [`Checker`] for the Modest toolset.
#[derive(Debug, Clone, Default)]
pub struct ModestInvoker {
    config: CheckerConfig,
}

impl ModestInvoker {
    pub fn new(config: CheckerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Resolved executable path, or [`PsnError::ExternalToolMissing`].
    pub fn locate(&self) -> Result<PathBuf, PsnError> {
        let search_path = self.config.search_path.as_deref();
        resolve_executable(&self.config.executable, search_path).ok_or_else(|| {
            PsnError::ExternalToolMissing(
                ErrorInfo::new(
                    "checker-missing",
                    "checker executable not found on the search path",
                )
                .with_context("executable", self.config.executable.clone())
                .with_hint("install the checker or set `executable` to its full path"),
            )
        })
    }

    /// First line of `<executable> --version`, or `unknown` when nothing is printed.
    pub fn probe_version(&self) -> Result<String, PsnError> {
        let executable = self.locate()?;
        let mut command = Command::new(&executable);
        command.args(&self.config.launcher_args).arg("--version");
        let captured = self.run(command, &executable)?;
        Ok(captured
            .combined()
            .lines()
            .next()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .unwrap_or_else(|| "unknown".to_string()))
    }

    fn stage_inline(&self, text: &str) -> Result<TempPath, PsnError> {
        let dir = self.config.scratch_dir();
        fs::create_dir_all(&dir).map_err(|err| PsnError::io("scratch-mkdir", err, &dir))?;
        let mut file = tempfile::Builder::new()
            .prefix("psn-model-")
            .suffix(".modest")
            .tempfile_in(&dir)
            .map_err(|err| PsnError::io("scratch-create", err, &dir))?;
        if let Err(err) = file.write_all(text.as_bytes()).and_then(|_| file.flush()) {
            return Err(PsnError::io("scratch-write", err, file.path()));
        }
        Ok(file.into_temp_path())
    }

    fn run(&self, command: Command, executable: &Path) -> Result<Captured, PsnError> {
        run_captured(command, self.config.timeout()).map_err(|err| {
            let info = match err {
                RunError::Spawn(err) => ErrorInfo::new("checker-spawn", err.to_string()),
                RunError::Wait(err) => ErrorInfo::new("checker-wait", err.to_string()),
                RunError::TimedOut(limit) => ErrorInfo::new(
                    "checker-timeout",
                    format!("checker did not finish within {}s", limit.as_secs()),
                ),
            };
            let executable = executable.display().to_string();
            PsnError::ProcessInvocation(info.with_context("executable", executable))
        })
    }
}

impl Checker for ModestInvoker {
    /// Whether the executable resolves on the search path.
    fn is_available(&self) -> bool {
        self.locate().is_ok()
    }

    fn invoke(
        &self,
        mode: CheckMode,
        model: &ModelSource,
        options: &[String],
    ) -> Result<CheckerOutput, PsnError> {
        let executable = self.locate()?;
        let (model_path, staged) = match model {
            ModelSource::Inline(text) => {
                let temp = self.stage_inline(text)?;
                (temp.to_path_buf(), Some(temp))
            }
            ModelSource::File(path) => (path.clone(), None),
        };

        let mut command = Command::new(&executable);
        command
            .args(&self.config.launcher_args)
            .arg(mode.subcommand())
            .arg(&model_path)
            .args(mode.default_options())
            .args(options);
        debug!(?command, "invoking checker");

        let captured = self.run(command, &executable)?;
        let text = captured.combined();
        let mut output = CheckerOutput {
            exit_code: captured.status.code(),
            reported_error: text.contains(&self.config.error_marker),
            retained_model: None,
            text,
        };

        if let Some(temp) = staged {
            if output.reported_error {
                match temp.keep() {
                    Ok(path) => {
                        warn!(model = %path.display(), "checker reported an error; keeping model");
                        output.retained_model = Some(path);
                    }
                    Err(err) => warn!(%err, "failed to keep temporary model"),
                }
            } else if let Err(err) = temp.close() {
                warn!(%err, "failed to remove temporary model");
            }
        }
        Ok(output)
    }
}
