#![allow(clippy::doc_markdown)]
//! `vecbench` - verify and time SIMD similarity kernels against a scalar reference.

mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use colored::Colorize;
use figment::providers::Serialized;
use figment::Figment;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vecbench_core::{Accumulation, BenchConfig, BenchRunner, CandidateKernel, Metric, VerifyMode};

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable tables
    Text,
    /// Pretty-printed JSON on stdout
    Json,
}

/// vecbench - SIMD similarity kernel verifier and benchmark
#[derive(Parser, Debug)]
#[command(name = "vecbench")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "VECBENCH_CONFIG")]
    config: Option<PathBuf>,

    /// Vector dimension
    #[arg(short, long)]
    dimension: Option<usize>,

    /// Number of corpus vectors
    #[arg(short = 'n', long)]
    corpus_size: Option<usize>,

    /// Timed passes over the corpus
    #[arg(short, long)]
    iterations: Option<usize>,

    /// Untimed warm-up calls before each timed loop
    #[arg(long)]
    warmup: Option<usize>,

    /// RNG seed (random when omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Verification mode: fail-fast or full-scan
    #[arg(long)]
    mode: Option<VerifyMode>,

    /// Metric to run (repeatable): squared-l2, inner-product, cosine
    #[arg(short, long = "metric")]
    metrics: Vec<Metric>,

    /// Candidate kernel: auto, lanes4, lanes16, avx2, neon
    #[arg(short, long)]
    kernel: Option<CandidateKernel>,

    /// Accumulation for portable kernels: auto, fused, pairwise
    #[arg(long)]
    accumulation: Option<Accumulation>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

impl Args {
    /// Merges explicitly passed flags on top of `figment`.
    fn apply_overrides(&self, figment: Figment) -> Figment {
        let mut figment = figment;
        if let Some(dimension) = self.dimension {
            figment = figment.merge(Serialized::default("dimension", dimension));
        }
        if let Some(corpus_size) = self.corpus_size {
            figment = figment.merge(Serialized::default("corpus_size", corpus_size));
        }
        if let Some(iterations) = self.iterations {
            figment = figment.merge(Serialized::default("iterations", iterations));
        }
        if let Some(warmup) = self.warmup {
            figment = figment.merge(Serialized::default("warmup_rounds", warmup));
        }
        if let Some(seed) = self.seed {
            figment = figment.merge(Serialized::default("seed", seed));
        }
        if let Some(mode) = self.mode {
            figment = figment.merge(Serialized::default("mode", mode));
        }
        if !self.metrics.is_empty() {
            figment = figment.merge(Serialized::default("metrics", &self.metrics));
        }
        if let Some(kernel) = self.kernel {
            figment = figment.merge(Serialized::default("kernel.candidate", kernel));
        }
        if let Some(accumulation) = self.accumulation {
            figment = figment.merge(Serialized::default("kernel.accumulation", accumulation));
        }
        figment
    }

    fn load_config(&self) -> vecbench_core::Result<BenchConfig> {
        let figment = self.apply_overrides(BenchConfig::figment(self.config.as_deref())?);
        BenchConfig::from_figment(&figment)
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(args: &Args) -> anyhow::Result<()> {
    let config = args.load_config()?;

    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    tracing::info!(
        dimension = config.dimension,
        corpus_size = config.corpus_size,
        iterations = config.iterations,
        mode = %config.mode,
        "configuration loaded"
    );

    let report = BenchRunner::new(config)?.run()?;

    match args.format {
        OutputFormat::Text => render::print_report(&report),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }

    if !report.passed() {
        tracing::warn!("verification found out-of-tolerance results; see report");
    }
    Ok(())
}

/// Exit status for a failed run: the core error's code, or 1.
fn exit_status(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<vecbench_core::Error>()
        .and_then(|e| u8::try_from(e.exit_code()).ok())
        .unwrap_or(1)
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::from(exit_status(&err))
        }
    }
}
