use std::path::PathBuf;
use std::process::ExitCode;

use quantum_field::prelude::*;

const USAGE: &str = "usage: quantum-field [--config <file.json>] [--line] [--static] [--fallback-png <file.png>]";

struct Args {
    config: Option<PathBuf>,
    line: bool,
    force_static: bool,
    fallback_png: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        config: None,
        line: false,
        force_static: false,
        fallback_png: None,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => args.config = Some(iter.next().ok_or("--config needs a path")?.into()),
            "--fallback-png" => args.fallback_png = Some(iter.next().ok_or("--fallback-png needs a path")?.into()),
            "--line" => args.line = true,
            "--static" => args.force_static = true,
            other => return Err(format!("unknown argument: {other}")),
        }
    }
    Ok(args)
}

fn run(args: Args) -> Result<(), FieldError> {
    let mut config = match &args.config {
        Some(path) => FieldConfig::from_json_file(path)?,
        None => FieldConfig::default(),
    };
    if args.line {
        config = config.with_footprint(Footprint::Line);
    }

    let mut field = ParticleField::new(config);
    if args.force_static {
        field = field.with_probe(false);
    }
    if let Some(path) = args.fallback_png {
        field = field.with_fallback_image(path);
    }
    field.run()
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{msg}\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
