// SPDX-License-Identifier: Apache-2.0

//! `kexbench` - run, import, and summarize key-establishment benchmarks.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use kexbench_core::{
    import_report, render_table, run_openssl_speed, write_summary_csv, Aggregator, BenchConfig,
    MlKem, ResultStore, SystemInfo, TrialRunner, X25519Exchange,
};

#[derive(Parser)]
#[command(name = "kexbench")]
#[command(about = "Benchmark classical ECDH against post-quantum KEMs")]
struct Cli {
    /// Experiment plan file (defaults used when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run in-process timing trials for the configured schemes
    Run {
        /// Override the number of measured trials
        #[arg(short, long)]
        trials: Option<u32>,

        /// Override the number of warmup cycles
        #[arg(short, long)]
        warmup: Option<u32>,
    },
    /// Invoke `openssl speed` (or parse a saved report) and append its
    /// per-operation aggregates to the result store
    ImportOpenssl {
        /// Parse an existing report instead of invoking the tool
        #[arg(long)]
        from_file: Option<PathBuf>,
    },
    /// Aggregate the result store into a summary table
    Summarize,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    let config = match &cli.config {
        Some(path) => BenchConfig::load_file(path)?,
        None => BenchConfig::defaults(),
    };

    match cli.command {
        Commands::Run { trials, warmup } => run_trials(&config, trials, warmup),
        Commands::ImportOpenssl { from_file } => import_openssl(&config, from_file),
        Commands::Summarize => summarize(&config),
    }
}

fn run_trials(config: &BenchConfig, trials: Option<u32>, warmup: Option<u32>) -> anyhow::Result<()> {
    let store = ResultStore::new(&config.output);
    store.ensure()?;

    if let Some(dir) = config.output.parent() {
        let path = SystemInfo::collect().save_next_to(dir)?;
        tracing::debug!(path = %path.display(), "Saved environment snapshot");
    }

    let trials = trials.unwrap_or(config.trials);
    let warmup = warmup.unwrap_or(config.warmup);

    // Configurations run strictly one after another; concurrent trials
    // would corrupt the quantity being measured.
    let outcome = TrialRunner::new()
        .trials(trials)
        .warmup(warmup)
        .run(&X25519Exchange, &store)?;
    println!(
        "{}: {} trials, mean {:.6} ms/op",
        outcome.configuration, outcome.trials, outcome.mean_time_ms
    );

    for level in &config.kem_levels {
        let outcome = TrialRunner::new()
            .trials(trials)
            .warmup(warmup)
            .batch_size(config.kem_batch_size)
            .run(&MlKem::new(*level), &store)?;
        println!(
            "{}: {} trials, mean {:.6} ms/op",
            outcome.configuration, outcome.trials, outcome.mean_time_ms
        );
    }

    println!("Results appended to {}", config.output.display());
    Ok(())
}

fn import_openssl(config: &BenchConfig, from_file: Option<PathBuf>) -> anyhow::Result<()> {
    let report = match from_file {
        Some(path) => std::fs::read_to_string(&path)?,
        None => run_openssl_speed(config.openssl.seconds)?,
    };

    let store = ResultStore::new(&config.output);
    let imported = import_report(&store, &report, &config.openssl.algorithms, "openssl")?;

    if imported == 0 {
        println!("No matching benchmark lines for the requested algorithms");
    } else {
        println!(
            "Appended {} openssl rows to {}",
            imported,
            config.output.display()
        );
    }
    Ok(())
}

fn summarize(config: &BenchConfig) -> anyhow::Result<()> {
    let store = ResultStore::new(&config.output);
    let records = store.read_all()?;

    let rows = Aggregator::new(&config.baseline).summarize(&records);
    print!("{}", render_table(&rows));

    write_summary_csv(&config.summary, &rows)?;
    println!("Saved summary to {}", config.summary.display());
    Ok(())
}
