use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Args;
use psn_check::CheckerConfig;

pub mod batch;
pub mod check;
pub mod doctor;
pub mod sweep;
pub mod version;

/// Checker selection shared by every command that runs the checker.
#[derive(Args, Debug, Clone, Default)]
pub struct CheckerArgs {
    /// YAML checker configuration. The flags below override its fields.
    #[arg(long)]
    pub checker_config: Option<PathBuf>,
    /// Checker executable name or path.
    #[arg(long)]
    pub modest: Option<String>,
    /// Kill the checker after this many seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,
    /// Directory for temporary model files.
    #[arg(long)]
    pub scratch_dir: Option<PathBuf>,
}

impl CheckerArgs {
    pub fn config(&self) -> Result<CheckerConfig, Box<dyn Error>> {
        let mut config = match &self.checker_config {
            Some(path) => serde_yaml::from_str(&fs::read_to_string(path)?)?,
            None => CheckerConfig::default(),
        };
        if let Some(executable) = &self.modest {
            config.executable = executable.clone();
        }
        if self.timeout_secs.is_some() {
            config.timeout_secs = self.timeout_secs;
        }
        if self.scratch_dir.is_some() {
            config.scratch_dir = self.scratch_dir.clone();
        }
        Ok(config)
    }
}
