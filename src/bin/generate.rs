use std::path::Path;

use serde::Serialize;

use causal_lab::constants::DEFAULT_SEED;
use causal_lab::env_config::init_tracing;
use causal_lab::scenario::{WORLD_IV_A, WORLD_NAMES};
use causal_lab::simulation::{generate_once, GeneratedData};
use causal_lab::{ConfigResult, EstimationResult, Scenario, SeKind};

const USAGE: &str =
    "Usage: generate [--world NAME] [--n N] [--seed S] [--config FILE] [--robust] [--output FILE]";

struct Args {
    world: String,
    n: Option<usize>,
    seed: u64,
    config: Option<String>,
    robust: bool,
    output: Option<String>,
}

/// One dataset with its ground truth and every applicable estimate.
#[derive(Serialize)]
struct Export {
    scenario: Scenario,
    seed: u64,
    true_effect: f64,
    /// In-sample ATT (DID) or CACE (IV) from the potential outcomes.
    sample_effect: Option<f64>,
    estimates: Vec<EstimationResult>,
    data: GeneratedData,
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> T {
    let Some(raw) = args.get(i) else {
        eprintln!("Missing value for {}", flag);
        std::process::exit(1);
    };
    raw.parse().unwrap_or_else(|_| {
        eprintln!("Invalid {} value: {}", flag, raw);
        std::process::exit(1);
    })
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args {
        world: WORLD_IV_A.to_string(),
        n: None,
        seed: DEFAULT_SEED,
        config: None,
        robust: false,
        output: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--world" => {
                i += 1;
                parsed.world = parse_value(&args, i, "--world");
            }
            "--n" => {
                i += 1;
                parsed.n = Some(parse_value(&args, i, "--n"));
            }
            "--seed" => {
                i += 1;
                parsed.seed = parse_value(&args, i, "--seed");
            }
            "--config" => {
                i += 1;
                parsed.config = Some(parse_value(&args, i, "--config"));
            }
            "--output" => {
                i += 1;
                parsed.output = Some(parse_value(&args, i, "--output"));
            }
            "--robust" => {
                parsed.robust = true;
            }
            "--help" | "-h" => {
                println!("{}", USAGE);
                println!();
                println!("Options:");
                println!("  --world NAME    World preset: {} (default: {})", WORLD_NAMES.join(", "), WORLD_IV_A);
                println!("  --n N           Override the sample size");
                println!("  --seed S        Dataset seed (default: {})", DEFAULT_SEED);
                println!("  --config FILE   JSON scenario file (replaces --world)");
                println!("  --robust        HC1 standard errors instead of classical");
                println!("  --output FILE   Write JSON to FILE instead of stdout");
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                eprintln!("{}", USAGE);
                std::process::exit(1);
            }
        }
        i += 1;
    }
    parsed
}

fn build(args: &Args) -> ConfigResult<Export> {
    let scenario = match &args.config {
        Some(path) => Scenario::from_json_file(Path::new(path))?,
        None => Scenario::preset(&args.world)?,
    };
    let scenario = match args.n {
        Some(n) => scenario.with_sample_size(n),
        None => scenario,
    };
    scenario.validate()?;

    let se_kind = if args.robust {
        SeKind::Robust
    } else {
        SeKind::Classical
    };
    let data = generate_once(&scenario, args.seed)?;
    let sample_effect = match &data {
        GeneratedData::Did(d) => d.sample_att(),
        GeneratedData::Iv(d) => d.sample_cace(),
    };
    Ok(Export {
        true_effect: scenario.true_effect(),
        seed: args.seed,
        sample_effect,
        estimates: data.estimate_all(se_kind),
        data,
        scenario,
    })
}

fn main() {
    let args = parse_args();
    init_tracing();

    let export = build(&args).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(2);
    });
    for r in &export.estimates {
        eprintln!(
            "{:<16} {:>10.4} (se {:.4}, p {:.3})",
            r.method.as_str(),
            r.estimate,
            r.std_error,
            r.p_value
        );
    }

    let json = serde_json::to_string_pretty(&export).unwrap_or_else(|e| {
        eprintln!("Failed to serialize dataset: {}", e);
        std::process::exit(1);
    });
    match &args.output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, json + "\n") {
                eprintln!("Failed to write {}: {}", path, e);
                std::process::exit(1);
            }
            eprintln!("Wrote {}", path);
        }
        None => println!("{}", json),
    }
}
