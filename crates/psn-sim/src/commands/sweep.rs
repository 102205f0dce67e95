use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use psn_check::ModestInvoker;
use psn_core::{NoiseKind, SweepParams, DEFAULT_BLOCK_SIZE, DEFAULT_CONVERGENCE_MARGIN};
use psn_drive::{
    parameter_summary, persist, run_sweep, topology_dir, ModelRenderer, RendererSpec,
};
use tracing::{error, info};

use super::CheckerArgs;

#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Edge length of the square mesh.
    #[arg(long)]
    pub size: u32,
    /// Noise kind: resistive or inductive.
    #[arg(long)]
    pub noise: NoiseKind,
    /// Noise threshold passed to the model renderer.
    #[arg(long)]
    pub threshold: u32,
    /// Model every `stride`-th clock cycle.
    #[arg(long, default_value_t = 1)]
    pub stride: u64,
    /// Modelled points per checker invocation.
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE)]
    pub block_size: u64,
    /// Last clock cycle to simulate. Sweeps until convergence when absent.
    #[arg(long)]
    pub clock_upper: Option<u64>,
    /// Convergence margin below probability 1.
    #[arg(long, default_value_t = DEFAULT_CONVERGENCE_MARGIN)]
    pub margin: f64,
    /// Extra checker option, repeatable (e.g. `--checker-option=-N`).
    #[arg(long = "checker-option", allow_hyphen_values = true)]
    pub checker_options: Vec<String>,
    /// Model template with `{{placeholder}}` tokens.
    #[arg(long, conflicts_with = "generator", required_unless_present = "generator")]
    pub template: Option<PathBuf>,
    /// Model generator program writing the model to stdout.
    #[arg(long)]
    pub generator: Option<String>,
    /// Argument passed to the generator before the block parameters, repeatable.
    #[arg(long = "generator-arg", allow_hyphen_values = true)]
    pub generator_args: Vec<String>,
    /// Results root; files land in `<out>/<n>x<n>/`.
    #[arg(long, default_value = "results")]
    pub out: PathBuf,
    #[command(flatten)]
    pub checker: CheckerArgs,
}

impl SweepArgs {
    fn params(&self) -> SweepParams {
        let mut params = SweepParams::new(self.size, self.noise, self.threshold, self.stride);
        params.block_size = self.block_size;
        params.clock_upper = self.clock_upper;
        params.convergence_margin = self.margin;
        params.checker_options = self.checker_options.clone();
        params
    }

    fn renderer_spec(&self) -> RendererSpec {
        match (&self.template, &self.generator) {
            (Some(path), _) => RendererSpec::Template { path: path.clone() },
            (None, program) => RendererSpec::Command {
                program: program.clone().unwrap_or_default(),
                args: self.generator_args.clone(),
            },
        }
    }
}

pub fn run(args: &SweepArgs) -> Result<(), Box<dyn Error>> {
    let params = args.params();
    params.validate()?;

    let checker = ModestInvoker::new(args.checker.config()?);
    let executable = checker.locate()?;
    info!(executable = %executable.display(), version = %checker.probe_version()?, "checker ready");
    let renderer: Box<dyn ModelRenderer + Send + Sync> = args.renderer_spec().build()?;

    print!("{}", parameter_summary(&params)?);
    match run_sweep(&params, renderer.as_ref(), &checker) {
        Ok(result) => {
            let paths = persist(&result, &topology_dir(&args.out, params.topology_size))?;
            let termination = result.termination.map(|t| t.to_string());
            println!("Termination: {}", termination.unwrap_or_default());
            println!("Samples: {}", result.samples.len());
            println!("Data: {}", paths.data.display());
            println!("Timing: {}", paths.timing.display());
            Ok(())
        }
        Err(failure) => {
            error!(
                blocks = failure.partial.blocks.len(),
                samples = failure.partial.samples.len(),
                "sweep aborted; partial results are not persisted"
            );
            Err(failure.into())
        }
    }
}
