//! Dining philosophers CLI.
//!
//! Seats N philosophers around a table, runs them under the arbiter and prints one
//! line per event followed by a summary.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use philosophers::{
    Config, Coordinator, DEFAULT_MAX_ACTORS, LogWriter, Outcome, RuntimeError, Subscribe, TieBreak,
};

#[derive(Parser)]
#[command(name = "philosophers")]
#[command(about = "Dining philosophers under a central arbiter (at most two eat at once)")]
struct Cli {
    /// Number of philosophers
    #[arg(short = 'n', long = "actors", default_value_t = 5)]
    actors: usize,

    /// Number of portions per philosopher
    #[arg(short = 'p', long = "portions", default_value_t = 3)]
    portions: u32,

    /// Seconds the arbiter waits for a message before giving up
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Upper bound on the number of philosophers
    #[arg(long, default_value_t = DEFAULT_MAX_ACTORS)]
    max_actors: usize,

    /// Chopstick pick-up order: coin, left, right
    #[arg(long, default_value = "coin")]
    order: String,

    /// Only print the banner and the summary
    #[arg(long, short)]
    quiet: bool,

    /// Also print every chopstick pick-up and put-down
    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(Outcome::AllFinished(_)) => ExitCode::SUCCESS,
        Ok(Outcome::TimedOut(_)) => ExitCode::from(1),
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<Outcome> {
    let tie_break: TieBreak = cli
        .order
        .parse()
        .map_err(anyhow::Error::msg)
        .context("invalid --order")?;

    let mut cfg = Config::new(cli.actors, cli.portions)
        .with_timeout(Duration::from_secs(cli.timeout))
        .with_tie_break(tie_break);
    cfg.max_actors = cli.max_actors;

    if let Err(e) = cfg.validate() {
        return Err(RuntimeError::from(e)).context("invalid parameters");
    }

    banner(&cfg);

    let mut subs: Vec<Arc<dyn Subscribe>> = Vec::new();
    if !cli.quiet {
        let writer = if cli.verbose {
            LogWriter::new().with_resources()
        } else {
            LogWriter::new()
        };
        subs.push(Arc::new(writer));
    }

    let outcome = Coordinator::builder(cfg)
        .with_subscribers(subs)
        .build()
        .run()
        .await
        .context("run failed")?;

    report(&outcome);
    Ok(outcome)
}

fn banner(cfg: &Config) {
    println!("Welcome to the dining philosophers problem!");
    println!("-------------------------------------------");
    println!();
    println!("Change the number of philosophers and portions with the -n and -p flags.");
    println!("Example: philosophers -n 10 -p 5");
    println!();
    println!("Number of philosophers: {}", cfg.actors);
    println!("Number of portions per philosopher: {}", cfg.work_units);
    println!();
}

fn report(outcome: &Outcome) {
    let s = outcome.summary();
    println!();
    match outcome {
        Outcome::AllFinished(_) => {
            println!("All philosophers are done eating, host has exited, program is done.");
        }
        Outcome::TimedOut(_) => {
            let unfinished: Vec<usize> = s.unfinished().iter().map(|a| a + 1).collect();
            println!(
                "Timeout, host is exiting. {} of {} philosophers finished; still hungry: {:?}",
                s.finished, s.actors, unfinished
            );
        }
    }
    println!(
        "portions eaten: {}/{}, grants: {}, queued: {}, longest queue: {}, elapsed: {:?}",
        s.total_performed(),
        s.total_expected(),
        s.stats.grants,
        s.stats.queued,
        s.stats.max_queue,
        s.elapsed
    );
}
