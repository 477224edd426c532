use std::time::Duration;

use clap::Parser;
use clap::Subcommand;
use itertools::Itertools;
use miette::miette;

#[derive(Parser, Debug)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the token list for an expression
    Tokenize { expr: String },
    /// Parse a statement and print its round-trip form
    Parse { expr: String },
    /// Search parameter combinations that best satisfy a statement
    Solve {
        expr: String,
        /// NAME=SERIES:low..high for a sweep, or NAME=value for a fixed value
        #[arg(long = "param", value_name = "SPEC")]
        params: Vec<String>,
        /// Time budget per scheduling slice, in milliseconds
        #[arg(long, default_value_t = 100)]
        budget_ms: u64,
        /// How many of the best results to print
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

fn main() -> miette::Result<()> {
    let args = Args::parse();

    match args.command {
        Commands::Tokenize { expr } => {
            for token in ebrute::Lexer::new(&expr) {
                println!("{token}");
            }
        }
        Commands::Parse { expr } => {
            let statement = ebrute::parse_statement(&expr)?;
            println!("{statement}");
        }
        Commands::Solve {
            expr,
            params,
            budget_ms,
            top,
        } => {
            let statement = ebrute::parse_statement(&expr)?;
            let params = params
                .iter()
                .map(|spec| parse_param(spec))
                .collect::<miette::Result<Vec<_>>>()?;

            let missing = statement
                .free_vars()
                .into_iter()
                .filter(|name| !params.iter().any(|p| p.name == *name))
                .collect::<Vec<_>>();
            if !missing.is_empty() {
                return Err(miette!(
                    help = "declare each with --param NAME=SPEC",
                    "missing parameters for: {}",
                    missing.iter().join(", ")
                ));
            }

            let mut bruter =
                ebrute::Bruter::new(statement, params, Duration::from_millis(budget_ms))
                    .on_progress(|steps, total| eprint!("\r{steps}/{total}"));
            bruter.run();
            eprintln!();

            let results = bruter.results();
            println!(
                "{} of {} combinations scored",
                results.len(),
                bruter.total_steps()
            );
            for (rank, result) in results.iter().take(top).enumerate() {
                println!("\n#{} (cost {:.4e})", rank + 1, result.cost);
                for (label, value) in &result.info {
                    println!("  {label} = {value}");
                }
                for (name, value) in &result.context {
                    println!("  {name} = {value:#}");
                }
            }
        }
    }
    Ok(())
}

fn parse_param(spec: &str) -> miette::Result<ebrute::Parameter> {
    let Some((name, value)) = spec.split_once('=') else {
        return Err(miette!(
            "invalid parameter `{spec}`, expected NAME=VALUE or NAME=SERIES:low..high"
        ));
    };
    if let Some((series_name, range)) = value.split_once(':') {
        let series = ebrute::Series::by_name(series_name).ok_or_else(|| {
            miette!(
                "unknown series `{series_name}`, expected one of {}",
                ebrute::series::ALL.iter().map(|s| s.name).join(", ")
            )
        })?;
        let Some((low, high)) = range.split_once("..") else {
            return Err(miette!("invalid range `{range}`, expected low..high"));
        };
        ebrute::Parameter::swept(name, series, low, high)
    } else {
        ebrute::Parameter::fixed(name, value)
    }
}
