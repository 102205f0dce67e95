use std::error::Error;
use std::fs;

use clap::Args;
use psn_check::ModestInvoker;
use psn_drive::to_canonical_json_bytes;
use serde::Serialize;

use super::CheckerArgs;

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Emit only JSON without additional context.
    #[arg(long)]
    pub quiet: bool,
    #[command(flatten)]
    pub checker: CheckerArgs,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: String,
    ok: bool,
    detail: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    status: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(args: &DoctorArgs) -> Result<(), Box<dyn Error>> {
    let report = diagnose(&ModestInvoker::new(args.checker.config()?));
    let rendered = String::from_utf8(to_canonical_json_bytes(&report)?)?;
    if args.quiet {
        println!("{}", rendered);
    } else {
        println!("psn-sim doctor status: {}", report.status);
        println!("{}", rendered);
    }
    if report.status != "ok" {
        return Err("one or more checks failed".into());
    }
    Ok(())
}

fn diagnose(checker: &ModestInvoker) -> DoctorReport {
    let mut checks = Vec::new();
    match checker.locate() {
        Ok(path) => {
            checks.push(DoctorCheck {
                name: "checker executable".into(),
                ok: true,
                detail: path.display().to_string(),
            });
            checks.push(match checker.probe_version() {
                Ok(version) => DoctorCheck {
                    name: "checker version".into(),
                    ok: true,
                    detail: version,
                },
                Err(err) => DoctorCheck {
                    name: "checker version".into(),
                    ok: false,
                    detail: err.to_string(),
                },
            });
        }
        Err(err) => checks.push(DoctorCheck {
            name: "checker executable".into(),
            ok: false,
            detail: err.to_string(),
        }),
    }
    checks.push(check_scratch(checker));

    let status = if checks.iter().all(|check| check.ok) {
        "ok"
    } else {
        "needs-attention"
    };
    DoctorReport {
        status: status.into(),
        checks,
    }
}

fn check_scratch(checker: &ModestInvoker) -> DoctorCheck {
    let dir = checker.config().scratch_dir();
    let probe = dir.join(".psn-doctor");
    let result = fs::create_dir_all(&dir)
        .and_then(|_| fs::write(&probe, b"ok"))
        .and_then(|_| fs::remove_file(&probe));
    DoctorCheck {
        name: "scratch directory".into(),
        ok: result.is_ok(),
        detail: match result {
            Ok(()) => dir.display().to_string(),
            Err(err) => format!("{}: {err}", dir.display()),
        },
    }
}
