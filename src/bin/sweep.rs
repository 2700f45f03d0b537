use std::time::Instant;

use causal_lab::constants::{DEFAULT_REPS, DEFAULT_SEED};
use causal_lab::env_config::{init_rayon_threads, init_tracing};
use causal_lab::simulation::{run_grid, BiasTable, MonteCarloRunner};
use causal_lab::{ConfigResult, Method, Scenario, SeKind};

const USAGE: &str =
    "Usage: sweep [--reps N] [--seed S] [--n N] [--all-methods] [--robust] [--output FILE]";

struct Args {
    reps: usize,
    seed: u64,
    n: Option<usize>,
    all_methods: bool,
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
        reps: DEFAULT_REPS,
        seed: DEFAULT_SEED,
        n: None,
        all_methods: false,
        robust: false,
        output: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
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
            "--output" => {
                i += 1;
                parsed.output = Some(parse_value(&args, i, "--output"));
            }
            "--all-methods" => {
                parsed.all_methods = true;
            }
            "--robust" => {
                parsed.robust = true;
            }
            "--help" | "-h" => {
                println!("{}", USAGE);
                println!();
                println!("Options:");
                println!("  --reps N        Monte Carlo repetitions per cell (default: {})", DEFAULT_REPS);
                println!("  --seed S        Run seed shared by every cell (default: {})", DEFAULT_SEED);
                println!("  --n N           Override the sample size of every world");
                println!("  --all-methods   Every compatible world x method pair, not just the");
                println!("                  DID-regression / as-treated / TSLS grid");
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

fn cells(args: &Args) -> Vec<(Scenario, Method)> {
    let grid = if args.all_methods {
        Scenario::presets()
            .into_iter()
            .flat_map(|s| {
                let design = s.design();
                Method::ALL
                    .into_iter()
                    .filter(move |m| m.applies_to(design))
                    .map(move |m| (s.clone(), m))
            })
            .collect()
    } else {
        BiasTable::default_grid()
    };
    match args.n {
        Some(n) => grid
            .into_iter()
            .map(|(s, m)| (s.with_sample_size(n), m))
            .collect(),
        None => grid,
    }
}

fn main() {
    let args = parse_args();
    init_tracing();
    let threads = init_rayon_threads();

    let run = || -> ConfigResult<BiasTable> {
        let runner = MonteCarloRunner::new(args.reps, args.seed)?;
        let se_kind = if args.robust {
            SeKind::Robust
        } else {
            SeKind::Classical
        };
        let cells = cells(&args);
        eprintln!(
            "Sweeping {} cells ({} reps each, seed={}, {} threads)",
            cells.len(),
            runner.reps(),
            runner.seed(),
            threads
        );
        run_grid(&cells, se_kind, &runner)
    };

    let start = Instant::now();
    let table = run().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(2);
    });

    eprintln!("{:<16} {:<16} {:>10} {:>10} {:>8}", "world", "method", "mean", "bias", "flagged");
    for row in &table.rows {
        eprintln!(
            "{:<16} {:<16} {:>10.4} {:>+10.4} {:>8}",
            row.world,
            row.method.as_str(),
            row.mean_estimate,
            row.bias,
            row.unreliable_reps
        );
    }
    eprintln!("Done in {:.2?}", start.elapsed());

    let json = serde_json::to_string_pretty(&table).unwrap_or_else(|e| {
        eprintln!("Failed to serialize table: {}", e);
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
