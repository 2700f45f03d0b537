use std::path::Path;
use std::time::Instant;

use causal_lab::constants::{DEFAULT_REPS, DEFAULT_SEED};
use causal_lab::env_config::{init_rayon_threads, init_tracing};
use causal_lab::scenario::{WORLD_IV_A, WORLD_NAMES};
use causal_lab::simulation::{run_cell, MonteCarloRunner};
use causal_lab::types::Design;
use causal_lab::{ConfigError, ConfigResult, Method, Scenario, SeKind};

const USAGE: &str = "Usage: simulate [--world NAME] [--method NAME] [--reps N] [--seed S] [--n N] [--config FILE] [--robust] [--output FILE]";

struct Args {
    world: String,
    method: Option<String>,
    reps: usize,
    seed: u64,
    n: Option<usize>,
    config: Option<String>,
    robust: bool,
    output: Option<String>,
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
        method: None,
        reps: DEFAULT_REPS,
        seed: DEFAULT_SEED,
        n: None,
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
            "--method" => {
                i += 1;
                parsed.method = Some(parse_value(&args, i, "--method"));
            }
            "--reps" => {
                i += 1;
                parsed.reps = parse_value(&args, i, "--reps");
            }
            "--seed" => {
                i += 1;
                parsed.seed = parse_value(&args, i, "--seed");
            }
            "--n" => {
                i += 1;
                parsed.n = Some(parse_value(&args, i, "--n"));
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
                println!("  --method NAME   did_regression, did_two_by_two, as_treated, tsls");
                println!("                  (default: did_regression for DID, tsls for IV)");
                println!("  --reps N        Monte Carlo repetitions (default: {})", DEFAULT_REPS);
                println!("  --seed S        Run seed (default: {})", DEFAULT_SEED);
                println!("  --n N           Override the sample size per dataset");
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

fn resolve_scenario(args: &Args) -> ConfigResult<Scenario> {
    let scenario = match &args.config {
        Some(path) => Scenario::from_json_file(Path::new(path))?,
        None => Scenario::preset(&args.world)?,
    };
    let scenario = match args.n {
        Some(n) => scenario.with_sample_size(n),
        None => scenario,
    };
    scenario.validate()?;
    Ok(scenario)
}

fn resolve_method(args: &Args, scenario: &Scenario) -> ConfigResult<Method> {
    match &args.method {
        Some(name) => Method::parse(name).ok_or_else(|| ConfigError::UnknownMethod(name.clone())),
        None => Ok(match scenario.design() {
            Design::Did => Method::DidRegression,
            Design::Iv => Method::Tsls,
        }),
    }
}

fn main() {
    let args = parse_args();
    init_tracing();
    let threads = init_rayon_threads();

    let run = || -> ConfigResult<_> {
        let scenario = resolve_scenario(&args)?;
        let method = resolve_method(&args, &scenario)?;
        let runner = MonteCarloRunner::new(args.reps, args.seed)?;
        let se_kind = if args.robust {
            SeKind::Robust
        } else {
            SeKind::Classical
        };
        eprintln!(
            "Simulating {} x {} ({} reps, n={}, seed={}, {} threads)",
            scenario.world(),
            method.as_str(),
            runner.reps(),
            scenario.n(),
            runner.seed(),
            threads
        );
        run_cell(&scenario, method, se_kind, &runner)
    };

    let start = Instant::now();
    let result = run().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(2);
    });
    eprintln!(
        "bias = {:+.4} (mean {:.4}, truth {:.4}, sd {:.4}) in {:.2?}",
        result.bias,
        result.mean_estimate,
        result.true_effect,
        result.sd_estimate,
        start.elapsed()
    );

    let json = serde_json::to_string_pretty(&result).unwrap_or_else(|e| {
        eprintln!("Failed to serialize result: {}", e);
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
