use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use psn_core::errors::{ErrorInfo, PsnError};
use psn_core::SimulationRequest;
use serde::{Deserialize, Serialize};

/// Produces the modelling-language program for one block.
pub trait ModelRenderer {
    fn render(&self, request: &SimulationRequest) -> Result<String, PsnError>;
}

impl<F> ModelRenderer for F
where
    F: Fn(&SimulationRequest) -> Result<String, PsnError>,
{
    fn render(&self, request: &SimulationRequest) -> Result<String, PsnError> {
        self(request)
    }
}

/// Substitutes `{{placeholder}}` tokens in a model template.
///
/// Recognised tokens: `size`, `noise`, `threshold`, `clk_low`, `clk_high`,
/// `stride`. Anything else is left as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRenderer {
    template: String,
}

impl TemplateRenderer {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, PsnError> {
        let template = fs::read_to_string(path).map_err(|err| {
            PsnError::Render(ErrorInfo::new("template-read", err.to_string()).with_path(path))
        })?;
        Ok(Self::new(template))
    }
}

impl ModelRenderer for TemplateRenderer {
    fn render(&self, request: &SimulationRequest) -> Result<String, PsnError> {
        let mut text = self.template.clone();
        for (key, value) in placeholder_values(request) {
            text = text.replace(&format!("{{{{{key}}}}}"), &value);
        }
        Ok(text)
    }
}

fn placeholder_values(request: &SimulationRequest) -> [(&'static str, String); 6] {
    [
        ("size", request.topology_size().to_string()),
        ("noise", request.noise_kind().slug().to_string()),
        ("threshold", request.threshold().to_string()),
        ("clk_low", request.clock_low().to_string()),
        ("clk_high", request.clock_high().to_string()),
        ("stride", request.stride().to_string()),
    ]
}

/// Runs an external generator and uses its stdout as the model.
///
/// The generator receives `--size --noise --threshold --clk-low --clk-high
/// --stride` after the configured arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
}

impl CommandRenderer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl ModelRenderer for CommandRenderer {
    fn render(&self, request: &SimulationRequest) -> Result<String, PsnError> {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        for (key, value) in placeholder_values(request) {
            command.arg(format!("--{}", key.replace('_', "-"))).arg(value);
        }
        let output = command.output().map_err(|err| {
            PsnError::Render(
                ErrorInfo::new("generator-spawn", err.to_string())
                    .with_context("program", self.program.clone()),
            )
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PsnError::Render(
                ErrorInfo::new("generator-exit", stderr.trim().to_string())
                    .with_context("program", self.program.clone())
                    .with_context("status", output.status.to_string()),
            ));
        }
        String::from_utf8(output.stdout).map_err(|err| {
            PsnError::Render(
                ErrorInfo::new("generator-utf8", err.to_string())
                    .with_context("program", self.program.clone()),
            )
        })
    }
}

/// Serialisable renderer selection used by batch plans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RendererSpec {
    /// Template file with `{{placeholder}}` tokens.
    Template { path: PathBuf },
    /// Generator program writing the model to stdout.
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

impl RendererSpec {
    /// Resolves relative template paths against `base`.
    pub fn rebase(&mut self, base: &Path) {
        if let RendererSpec::Template { path } = self {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    pub fn build(&self) -> Result<Box<dyn ModelRenderer + Send + Sync>, PsnError> {
        match self {
            RendererSpec::Template { path } => Ok(Box::new(TemplateRenderer::from_file(path)?)),
            RendererSpec::Command { program, args } => {
                Ok(Box::new(CommandRenderer::new(program.clone(), args.clone())))
            }
        }
    }
}
