use clap::Parser;
use csslint_lib::config::LintConfig;
use csslint_lib::{handle, handle_batch, LightningEngine, LintRequest, LintResponse, Syntax};
use log::{debug, error};
use rayon::prelude::*;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "csslint")]
#[command(about = "Lint, autofix and re-format CSS and HTML style blocks")]
struct Args {
    /// Input files. `-` reads standard input.
    inputs: Vec<PathBuf>,

    /// Input syntax (css, html). Inferred from the file extension when omitted.
    #[arg(long)]
    syntax: Option<String>,

    /// Output style for CSS (compact, nested).
    #[arg(long, env = "CSSLINT_OUTPUT_STYLE")]
    style: Option<String>,

    /// Lint rule as `name=value`, may be repeated. Overrides --config.
    #[arg(short, long = "rule", value_name = "NAME=VALUE")]
    rules: Vec<String>,

    /// JSON file with `rules` and `outputStyle`.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Raw JSON request, from a file or `-` for standard input.
    #[arg(long, conflicts_with = "inputs")]
    request: Option<PathBuf>,

    /// Print response envelopes as JSON.
    #[arg(long)]
    json: bool,
}

fn read_source(path: &Path) -> io::Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        fs::read_to_string(path)
    }
}

fn load_config(args: &Args) -> csslint_lib::Result<LintConfig> {
    let mut config = match &args.config {
        Some(path) => LintConfig::load_from_path(path)?,
        None => LintConfig::default(),
    };
    for rule in &args.rules {
        config.set_rule(rule)?;
    }
    Ok(config)
}

/// Reports one response the way a compiler would. Returns false on failure.
fn report(label: &str, response: &LintResponse, json: bool) -> bool {
    if json {
        match serde_json::to_string_pretty(response) {
            Ok(text) => println!("{}", text),
            Err(e) => error!("cannot serialize response for {}: {}", label, e),
        }
    }

    match &response.content {
        Some(content) => {
            for warning in &content.warnings {
                match warning.line {
                    Some(_) => eprintln!("{}:{}", label, warning),
                    None => eprintln!("{}: {}", label, warning),
                }
            }
            if !json {
                println!("{}", content.output);
            }
            true
        }
        None => {
            if !json {
                eprintln!("{}: error: {}", label, response.message);
            }
            false
        }
    }
}

fn run_request(path: &Path, json: bool) -> ExitCode {
    let request: LintRequest = match read_source(path)
        .map_err(csslint_lib::Error::from)
        .and_then(|text| serde_json::from_str(&text).map_err(csslint_lib::Error::from))
    {
        Ok(request) => request,
        Err(e) => {
            eprintln!("{}: error: {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let response = handle(&LightningEngine, &request);
    if report(&path.display().to_string(), &response, json) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // parse the args given in terminal
    let args: Args = Args::parse();

    if let Some(path) = &args.request {
        return run_request(path, args.json);
    }
    if args.inputs.is_empty() {
        eprintln!("error: no input files (use `-` for standard input)");
        return ExitCode::FAILURE;
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let sources: Vec<io::Result<String>> = args
        .inputs
        .par_iter()
        .map(|path| read_source(path))
        .collect();

    let mut ok = true;
    let mut requests = Vec::new();
    let mut labels = Vec::new();
    for (path, source) in args.inputs.iter().zip(sources) {
        match source {
            Ok(code) => {
                let syntax = match &args.syntax {
                    Some(syntax) => syntax.clone(),
                    None => Syntax::from_path(path).to_string(),
                };
                debug!("{}: linting as {}", path.display(), syntax);
                requests.push(config.clone().into_request(code, &syntax, args.style.clone()));
                labels.push(path.display().to_string());
            }
            Err(e) => {
                eprintln!("{}: error: {}", path.display(), e);
                ok = false;
            }
        }
    }

    let responses = handle_batch(&LightningEngine, &requests);
    for (label, response) in labels.iter().zip(&responses) {
        ok &= report(label, response, args.json);
    }

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
