use std::error::Error;

use clap::Args;
use psn_check::ModestInvoker;
use psn_drive::to_canonical_json_bytes;
use serde::Serialize;

use super::CheckerArgs;

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Emit extended metadata including the checker version.
    #[arg(long)]
    pub long: bool,
    #[command(flatten)]
    pub checker: CheckerArgs,
}

#[derive(Debug, Serialize)]
struct VersionInfo {
    version: String,
    checker: String,
    checker_version: String,
}

pub fn run(args: &VersionArgs) -> Result<(), Box<dyn Error>> {
    if !args.long {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }
    let config = args.checker.config()?;
    let checker = ModestInvoker::new(config.clone());
    let info = VersionInfo {
        version: env!("CARGO_PKG_VERSION").into(),
        checker: config.executable,
        checker_version: checker
            .probe_version()
            .unwrap_or_else(|_| "unavailable".into()),
    };
    println!("{}", String::from_utf8(to_canonical_json_bytes(&info)?)?);
    Ok(())
}
