//! CandleLab CLI: run, compare, and synthetic-data commands.
//!
//! Commands:
//! - `run`: backtest one strategy over a candle file
//! - `compare`: backtest several strategies over the same candles
//! - `synthetic`: write a deterministic random-walk candle file

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use candlelab_core::strategy::StrategyParams;
use candlelab_runner::data_loader::{
    load_candles, load_synthetic, parse_timestamp, write_candles_csv, write_candles_parquet,
    LoadedCandles,
};
use candlelab_runner::export::{
    export_json, render_comparison, render_summary, save_artifacts, save_comparison,
};
use candlelab_runner::{
    compare_strategies, comparison_rows, generate_synthetic, run_backtest, CandleInterval,
    RunConfig,
};

#[derive(Parser)]
#[command(
    name = "candlelab",
    version,
    about = "CandleLab: candle-by-candle strategy backtester"
)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Where candles come from and how the run is configured.
#[derive(Args)]
struct RunInput {
    /// Candle file (.csv or .parquet).
    #[arg(long, conflicts_with = "synthetic")]
    candles: Option<PathBuf>,

    /// Use N synthetic candles instead of a file (seeded by the symbol).
    #[arg(long, value_name = "N")]
    synthetic: Option<usize>,

    /// TOML run config. Flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Symbol label (also seeds synthetic data).
    #[arg(long)]
    symbol: Option<String>,

    /// Evaluate only the most recent N candles.
    #[arg(long)]
    periods: Option<usize>,

    /// Candle interval (1m, 5m, 15m, 30m, 1h, 4h, 1d, 1w); enables annualized ratios.
    #[arg(long)]
    interval: Option<CandleInterval>,

    /// Initial balance.
    #[arg(long)]
    balance: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest one strategy and print its summary.
    Run {
        #[command(flatten)]
        input: RunInput,

        /// Strategy name with default parameters (overrides the config's strategy).
        #[arg(long)]
        strategy: Option<String>,

        /// Fallback strategy consulted while the main one is inconclusive.
        #[arg(long)]
        fallback: Option<String>,

        /// Write result.json, equity.csv, trades.csv and summary.csv here.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the full result as JSON instead of the summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Backtest several strategies over the same candles.
    Compare {
        #[command(flatten)]
        input: RunInput,

        /// Strategies to compare. Defaults to every shipped strategy.
        #[arg(long, value_delimiter = ',')]
        strategies: Vec<String>,

        /// Write comparison.csv and per-strategy artifacts here.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Write a deterministic synthetic candle file.
    Synthetic {
        #[arg(long, default_value = "BTCUSDT")]
        symbol: String,

        #[arg(long, default_value_t = 7 * 24)]
        count: usize,

        #[arg(long, default_value = "1h")]
        interval: CandleInterval,

        /// First candle timestamp (RFC 3339 or epoch ms).
        #[arg(long, default_value = "2024-01-01T00:00:00Z")]
        start: String,

        /// Output file (.csv or .parquet).
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            input,
            strategy,
            fallback,
            output_dir,
            json,
        } => run_cmd(input, strategy, fallback, output_dir, json),
        Commands::Compare {
            input,
            strategies,
            output_dir,
        } => compare_cmd(input, strategies, output_dir),
        Commands::Synthetic {
            symbol,
            count,
            interval,
            start,
            out,
        } => synthetic_cmd(&symbol, count, interval, &start, &out),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

// ─── Commands ───────────────────────────────────────────────────────

fn run_cmd(
    input: RunInput,
    strategy: Option<String>,
    fallback: Option<String>,
    output_dir: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let mut config = build_config(&input)?;
    if let Some(name) = strategy {
        config.strategy = StrategyParams::from_name(&name)?;
    }
    if let Some(name) = fallback {
        config.fallback = Some(StrategyParams::from_name(&name)?);
    }

    let loaded = resolve_candles(&input, &config)?;
    let result = run_backtest(&loaded.candles, &config)?;

    if json {
        println!("{}", export_json(&result)?);
    } else {
        print!("{}", render_summary(&result));
    }

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&result, &dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn compare_cmd(input: RunInput, strategies: Vec<String>, output_dir: Option<PathBuf>) -> Result<()> {
    let config = build_config(&input)?;
    let params = strategy_list(&strategies)?;

    let loaded = resolve_candles(&input, &config)?;
    let results = compare_strategies(&loaded.candles, &config, &params)?;
    print!("{}", render_comparison(&comparison_rows(&results)));

    if let Some(dir) = output_dir {
        let path = save_comparison(&results, &dir)?;
        println!("Comparison saved to: {}", path.display());
    }
    Ok(())
}

fn synthetic_cmd(
    symbol: &str,
    count: usize,
    interval: CandleInterval,
    start: &str,
    out: &Path,
) -> Result<()> {
    if count == 0 {
        bail!("--count must be at least 1");
    }
    let start = parse_start(start)?;
    let candles = generate_synthetic(symbol, count, start, interval);

    match out.extension().and_then(|e| e.to_str()) {
        Some("parquet") => write_candles_parquet(&candles, out)?,
        Some("csv") => write_candles_csv(&candles, out)?,
        _ => bail!("--out must end in .csv or .parquet"),
    }
    println!("Wrote {count} {interval} candles for {symbol} to {}", out.display());
    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Config file (or defaults) with command-line overrides applied.
fn build_config(input: &RunInput) -> Result<RunConfig> {
    let mut config = match &input.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    if let Some(symbol) = &input.symbol {
        config.symbol = symbol.clone();
    }
    if input.periods.is_some() {
        config.periods = input.periods;
    }
    if input.interval.is_some() {
        config.interval = input.interval;
    }
    if let Some(balance) = input.balance {
        config.simulation.initial_balance = balance;
    }
    config.validate().context("invalid run configuration")?;
    Ok(config)
}

/// Named strategies with default parameters, or every shipped one when empty.
/// A name may appear only once, since each run gets its own artifact directory.
fn strategy_list(names: &[String]) -> Result<Vec<StrategyParams>> {
    if names.is_empty() {
        return Ok(StrategyParams::all_defaults());
    }
    let mut seen = BTreeSet::new();
    let mut params = Vec::with_capacity(names.len());
    for name in names {
        if !seen.insert(name.as_str()) {
            bail!("strategy '{name}' is listed more than once");
        }
        params.push(StrategyParams::from_name(name)?);
    }
    Ok(params)
}

fn resolve_candles(input: &RunInput, config: &RunConfig) -> Result<LoadedCandles> {
    let loaded = match (&input.candles, input.synthetic) {
        (Some(path), _) => load_candles(path)
            .with_context(|| format!("failed to load candles from {}", path.display()))?,
        (None, Some(count)) => {
            let interval = config.interval.unwrap_or(CandleInterval::OneHour);
            load_synthetic(&config.symbol, count, parse_start("2024-01-01T00:00:00Z")?, interval)?
        }
        (None, None) => bail!("one of --candles or --synthetic is required"),
    };
    info!(
        candles = loaded.candles.len(),
        source = ?loaded.source,
        dataset_hash = %loaded.dataset_hash,
        "candles ready"
    );
    Ok(loaded)
}

fn parse_start(value: &str) -> Result<DateTime<Utc>> {
    parse_timestamp(value).with_context(|| format!("unrecognised start timestamp '{value}'"))
}
