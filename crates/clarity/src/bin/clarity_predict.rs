//! Run one prediction with explanation from the command line.
//!
//! Usage:
//!   clarity-predict --model PATH [options]
//!
//! Options:
//!   --root DIR           Project root the artifact paths are relative to (default: .)
//!   --model PATH         Model artifact, relative to the root (required)
//!   --features a,b,...   Explicit feature order (default: from the model)
//!   --record FILE|-      JSON record to score (default: stdin)
//!   --ranked             Also print contributions by descending magnitude to stderr
//!
//! The result is printed to stdout as JSON. Logs go to stderr and follow
//! `RUST_LOG` (default: info).
//!
//! Example:
//!   echo '{"age": 52, "bmi": 31.2, "glucose": 140, "insulin": 18, "hdl": 1.1, "ldl": 3.9}' \
//!       | clarity-predict --root /srv/clarity --model models/model.json

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clarity::{PredictionService, Record, ServiceConfig};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "clarity-predict\n\n  --root <dir>         Project root (default: .)\n  --model <path>       Model artifact relative to the root (required)\n  --features <a,b,..>  Explicit feature order\n  --record <file|->    JSON record (default: stdin)\n  --ranked             Print ranked contributions to stderr";

#[derive(Debug)]
struct Args {
    root: PathBuf,
    model: PathBuf,
    features: Option<Vec<String>>,
    record: Option<PathBuf>,
    ranked: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut root = PathBuf::from(".");
    let mut model: Option<PathBuf> = None;
    let mut features: Option<Vec<String>> = None;
    let mut record: Option<PathBuf> = None;
    let mut ranked = false;

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        let mut value = |flag: &str| it.next().ok_or_else(|| format!("{flag} requires a value"));
        match arg.as_str() {
            "--root" => root = PathBuf::from(value("--root")?),
            "--model" => model = Some(PathBuf::from(value("--model")?)),
            "--features" => {
                let list = value("--features")?;
                features = Some(
                    list.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect(),
                );
            }
            "--record" => record = Some(PathBuf::from(value("--record")?)),
            "--ranked" => ranked = true,
            "--help" | "-h" => {
                eprintln!("{USAGE}");
                std::process::exit(0);
            }
            other => return Err(format!("unknown arg: {other}")),
        }
    }

    let model = model.ok_or_else(|| "--model is required".to_string())?;
    Ok(Args {
        root,
        model,
        features,
        record,
        ranked,
    })
}

fn read_record(source: Option<&PathBuf>) -> Result<Record, Box<dyn std::error::Error>> {
    let text = match source {
        Some(path) if path.as_os_str() != "-" => fs::read_to_string(path)?,
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(serde_json::from_str(&text)?)
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();

    let config = ServiceConfig::builder()
        .project_root(args.root)
        .model_path(args.model)
        .maybe_expected_features(args.features)
        .dispatch(tracing::Dispatch::new(subscriber))
        .build()?;
    let service = PredictionService::new(config)?;

    let record = read_record(args.record.as_ref())?;
    let result = service.run(&record)?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    if args.ranked {
        for (name, value) in result.ranked_contributions() {
            eprintln!("{name:>12} {value:+.4}");
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("error: {msg}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
