use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Executable name looked up on the search path by default.
pub const DEFAULT_EXECUTABLE: &str = "modest";

/// Output substring that marks a failed checker run.
///
/// When present, temporary model files are kept for inspection.
pub const DEFAULT_ERROR_MARKER: &str = "error:";

/// YAML-configurable settings for the external checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckerConfig {
    /// Executable name or path.
    #[serde(default = "default_executable")]
    pub executable: String,
    /// Arguments placed before the subcommand (e.g. a launcher's target assembly).
    #[serde(default)]
    pub launcher_args: Vec<String>,
    /// Replacement for `PATH` when resolving `executable`.
    #[serde(default)]
    pub search_path: Option<String>,
    /// Directory for temporary model files. Defaults to the system temp dir.
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
    /// Substring that flags a failed run.
    #[serde(default = "default_error_marker")]
    pub error_marker: String,
    /// Kill the checker after this many seconds. Unset waits indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_executable() -> String {
    DEFAULT_EXECUTABLE.to_string()
}

fn default_error_marker() -> String {
    DEFAULT_ERROR_MARKER.to_string()
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            launcher_args: Vec::new(),
            search_path: None,
            scratch_dir: None,
            error_marker: default_error_marker(),
            timeout_secs: None,
        }
    }
}

impl CheckerConfig {
    /// Config for an explicit executable with all other settings defaulted.
    pub fn for_executable(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Directory temporary models are written to.
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(env::temp_dir)
    }
}
