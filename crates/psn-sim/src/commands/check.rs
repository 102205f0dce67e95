use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use psn_check::{parse_report, CheckMode, Checker, ModelSource, ModestInvoker};
use tracing::warn;

use super::CheckerArgs;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Model file path, or model text when no such file exists.
    #[arg(long)]
    pub model: String,
    /// Run a statistical simulation instead of an exhaustive check.
    #[arg(long)]
    pub simulate: bool,
    /// Extra checker option, repeatable.
    #[arg(long = "option", allow_hyphen_values = true)]
    pub options: Vec<String>,
    /// Also write the raw checker output here.
    #[arg(long)]
    pub transcript: Option<PathBuf>,
    #[command(flatten)]
    pub checker: CheckerArgs,
}

pub fn run(args: &CheckArgs) -> Result<(), Box<dyn Error>> {
    let checker = ModestInvoker::new(args.checker.config()?);
    let mode = if args.simulate {
        CheckMode::Simulate
    } else {
        CheckMode::Check
    };
    let model = ModelSource::from_text_or_path(args.model.clone());
    let output = checker.invoke(mode, &model, &args.options)?;

    println!("{}", output.text);
    if let Some(path) = &args.transcript {
        output.write_transcript(path)?;
    }
    if let Some(kept) = &output.retained_model {
        warn!(model = %kept.display(), "model kept for inspection");
    }
    if mode == CheckMode::Simulate {
        let samples = parse_report(&output.text);
        println!("{}", serde_json::to_string_pretty(&samples)?);
    }
    Ok(())
}
