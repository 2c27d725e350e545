//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_weight_sink::CsvWeightSink;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{
    self as backtest_engine, compute_targets, BacktestConfig, Ranking, DEFAULT_FEE_RATE,
};
use crate::domain::code_data::{build_unified_timeline, CodeData};
use crate::domain::config_validation::{parse_date, read_mad_params, validate_config};
use crate::domain::error::MadError;
use crate::domain::metrics::Metrics;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::price_history::PriceHistory;
use crate::domain::sizing::TargetWeights;
use crate::domain::universe::{
    discover_listings, parse_codes, validate_universe, Listing, UniverseParams,
    DEFAULT_COARSE_COUNT, DEFAULT_MIN_PRICE,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::weight_sink::WeightSink;

#[derive(Parser, Debug)]
#[command(
    name = "madtrader",
    about = "Moving Average Distance long/short strategy"
)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a monthly-rebalanced backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Write every rebalance's target weights to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Comma-separated codes overriding [backtest] codes
        #[arg(long)]
        codes: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Rank the universe as of a date and print the target weights
    Rank {
        #[arg(short, long)]
        config: PathBuf,
        /// Ranking date (YYYY-MM-DD), defaults to [backtest] end_date
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        codes: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List available symbols on an exchange
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        exchange: Option<String>,
    },
    /// Show data range for symbol(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        exchange: Option<String>,
    },
}

pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            output,
            codes,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config, codes.as_deref())
            } else {
                run_backtest(&config, output.as_deref(), codes.as_deref())
            }
        }
        Command::Rank {
            config,
            date,
            codes,
        } => run_rank(&config, date.as_deref(), codes.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config, exchange } => {
            run_list_symbols(&config, exchange.as_deref())
        }
        Command::Info {
            config,
            code,
            exchange,
        } => run_info(&config, code.as_deref(), exchange.as_deref()),
    }
}

fn report(err: &MadError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, MadError> {
    FileConfigAdapter::from_file(path).map_err(|e| MadError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn load_validated(path: &Path) -> Result<FileConfigAdapter, MadError> {
    info!(path = %path.display(), "loading config");
    let adapter = load_config(path)?;
    validate_config(&adapter)?;
    Ok(adapter)
}

pub fn data_adapter(config: &dyn ConfigPort) -> Result<CsvAdapter, MadError> {
    let path = config
        .get_string("data", "path")
        .ok_or_else(|| MadError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        })?;
    Ok(CsvAdapter::new(PathBuf::from(path)))
}

pub fn build_universe_params(config: &dyn ConfigPort) -> Result<UniverseParams, MadError> {
    let defaults = UniverseParams::default();
    let exchanges = match config.get_string("universe", "exchanges") {
        Some(list) => parse_codes(&list).map_err(|e| MadError::ConfigInvalid {
            section: "universe".into(),
            key: "exchanges".into(),
            reason: e.to_string(),
        })?,
        None => defaults.exchanges,
    };
    let coarse_count = config.get_int("universe", "coarse_count", DEFAULT_COARSE_COUNT as i64);
    if coarse_count <= 0 {
        return Err(MadError::ConfigInvalid {
            section: "universe".into(),
            key: "coarse_count".into(),
            reason: "coarse_count must be positive".into(),
        });
    }

    Ok(UniverseParams {
        exchanges,
        min_price: config.get_double("universe", "min_price", DEFAULT_MIN_PRICE),
        coarse_count: coarse_count as usize,
    })
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, MadError> {
    let start_date = parse_date(
        adapter.get_string("backtest", "start_date").as_deref(),
        "start_date",
    )?;
    let end_date = parse_date(
        adapter.get_string("backtest", "end_date").as_deref(),
        "end_date",
    )?;

    Ok(BacktestConfig {
        start_date,
        end_date,
        initial_capital: adapter.get_double("backtest", "initial_capital", 100_000.0),
        fee_rate: adapter.get_double("backtest", "fee_rate", DEFAULT_FEE_RATE),
        risk_free_rate: adapter.get_double("backtest", "risk_free_rate", 0.0),
        mad: read_mad_params(adapter)?,
        universe: build_universe_params(adapter)?,
    })
}

/// Explicit code list from the CLI override or `[backtest] codes`.
///
/// `None` means every symbol listed on the configured exchanges.
pub fn resolve_codes(
    code_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Option<Vec<String>>, MadError> {
    let raw = match code_override {
        Some(c) => Some(c.to_string()),
        None => config.get_string("backtest", "codes"),
    };
    match raw {
        Some(list) => parse_codes(&list)
            .map(Some)
            .map_err(|e| MadError::ConfigInvalid {
                section: "backtest".into(),
                key: "codes".into(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

/// Fetch bars for each listing, skipping listings that fail to load.
pub fn load_code_data(
    data_port: &dyn DataPort,
    listings: &[Listing],
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<CodeData> {
    let mut code_data = Vec::with_capacity(listings.len());
    for listing in listings {
        match data_port.fetch_ohlcv(&listing.code, &listing.exchange, from, to) {
            Ok(bars) if !bars.is_empty() => code_data.push(CodeData::new(
                listing.code.clone(),
                listing.exchange.clone(),
                bars,
            )),
            Ok(_) => warn!(code = %listing.code, exchange = %listing.exchange, "no bars in range"),
            Err(e) => warn!(code = %listing.code, error = %e, "skipping listing"),
        }
    }
    code_data
}

fn run_backtest(config_path: &Path, output: Option<&Path>, code_override: Option<&str>) -> ExitCode {
    let adapter = match load_validated(config_path) {
        Ok(a) => a,
        Err(e) => return report(&e),
    };
    let prepared = build_backtest_config(&adapter)
        .and_then(|bt| Ok((bt, resolve_codes(code_override, &adapter)?)))
        .and_then(|(bt, codes)| Ok((bt, codes, data_adapter(&adapter)?)));
    let (bt_config, codes, data_port) = match prepared {
        Ok(p) => p,
        Err(e) => return report(&e),
    };

    let result = match output {
        Some(path) => match CsvWeightSink::create(path) {
            Ok(mut sink) => {
                let result = run_backtest_pipeline(&data_port, &bt_config, codes.as_deref(), &mut sink);
                if result.is_ok() {
                    eprintln!("\nWeights written to: {} ({} rows)", path.display(), sink.rows_written());
                }
                result
            }
            Err(e) => Err(e),
        },
        None => {
            let mut sink: Vec<(NaiveDate, TargetWeights)> = Vec::new();
            run_backtest_pipeline(&data_port, &bt_config, codes.as_deref(), &mut sink)
        }
    };

    match result {
        Ok(metrics) => {
            print_summary(&metrics);
            ExitCode::SUCCESS
        }
        Err(e) => report(&e),
    }
}

/// Universe discovery, data loading, backtest and metrics.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    bt_config: &BacktestConfig,
    codes: Option<&[String]>,
    sink: &mut dyn WeightSink,
) -> Result<Metrics, MadError> {
    let warmup_start = bt_config.warmup_start();

    let listings = discover_listings(data_port, &bt_config.universe.exchanges, codes)?;
    let validation = validate_universe(
        data_port,
        listings,
        warmup_start,
        bt_config.end_date,
        bt_config.mad.long_period,
    )?;
    if !validation.skipped.is_empty() {
        info!(
            skipped = validation.skipped.len(),
            "listings skipped during validation"
        );
    }

    let code_data = load_code_data(
        data_port,
        &validation.universe.listings,
        warmup_start,
        bt_config.end_date,
    );
    if code_data.is_empty() {
        return Err(MadError::NoData {
            code: "all".into(),
            exchange: bt_config.universe.exchanges.join(","),
        });
    }

    let timeline = build_unified_timeline(&code_data);
    info!(
        codes = code_data.len(),
        dates = timeline.len(),
        start = %bt_config.start_date,
        end = %bt_config.end_date,
        "running backtest"
    );

    let result = backtest_engine::run_backtest(&code_data, &timeline, bt_config, sink)?;
    Ok(Metrics::compute(&result, bt_config.risk_free_rate))
}

fn print_summary(metrics: &Metrics) {
    eprintln!("\n=== Results ===");
    eprintln!("Total Return:     {:.2}%", metrics.total_return * 100.0);
    eprintln!("Annualized:       {:.2}%", metrics.annualized_return * 100.0);
    eprintln!("Sharpe Ratio:     {:.2}", metrics.sharpe_ratio);
    eprintln!("Sortino Ratio:    {:.2}", metrics.sortino_ratio);
    eprintln!("Max Drawdown:     -{:.1}%", metrics.max_drawdown * 100.0);
    eprintln!("Rebalances:       {}", metrics.rebalance_count);
    eprintln!("Avg Longs:        {:.1}", metrics.avg_long_count);
    eprintln!("Avg Shorts:       {:.1}", metrics.avg_short_count);
    eprintln!("Avg Turnover:     {:.2}", metrics.avg_turnover);
    eprintln!("Fees Paid:        ${:.2}", metrics.fees_paid);
}

pub fn run_dry_run(config_path: &Path, code_override: Option<&str>) -> ExitCode {
    let adapter = match load_validated(config_path) {
        Ok(a) => a,
        Err(e) => return report(&e),
    };
    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return report(&e),
    };
    let codes = match resolve_codes(code_override, &adapter) {
        Ok(c) => c,
        Err(e) => return report(&e),
    };

    eprintln!("Config validated successfully");
    eprintln!("\nStrategy:");
    eprintln!(
        "  MAD = MA({}) / MA({})",
        bt_config.mad.short_period, bt_config.mad.long_period
    );
    eprintln!(
        "  long >= {}, short <= {}",
        bt_config.mad.long_threshold, bt_config.mad.short_threshold
    );
    eprintln!("\nBacktest:");
    eprintln!("  {} to {}", bt_config.start_date, bt_config.end_date);
    eprintln!("  warm-up from {}", bt_config.warmup_start());
    eprintln!("  fee rate: {}", bt_config.fee_rate);
    eprintln!("\nUniverse:");
    eprintln!("  exchanges: {}", bt_config.universe.exchanges.join(", "));
    eprintln!("  min price: {}", bt_config.universe.min_price);
    eprintln!("  coarse count: {}", bt_config.universe.coarse_count);
    match codes {
        Some(codes) => eprintln!("  codes: {}", codes.join(", ")),
        None => eprintln!("  codes: all listed"),
    }

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn run_rank(config_path: &Path, date: Option<&str>, code_override: Option<&str>) -> ExitCode {
    let adapter = match load_validated(config_path) {
        Ok(a) => a,
        Err(e) => return report(&e),
    };
    let prepared = build_backtest_config(&adapter)
        .and_then(|bt| Ok((bt, resolve_codes(code_override, &adapter)?)))
        .and_then(|(bt, codes)| Ok((bt, codes, data_adapter(&adapter)?)));
    let (bt_config, codes, data_port) = match prepared {
        Ok(p) => p,
        Err(e) => return report(&e),
    };
    let as_of = match date {
        Some(d) => match parse_date(Some(d), "date") {
            Ok(d) => d,
            Err(e) => return report(&e),
        },
        None => bt_config.end_date,
    };

    match rank_as_of(&data_port, &bt_config, codes.as_deref(), as_of) {
        Ok(ranking) => {
            print_ranking(as_of, &ranking);
            ExitCode::SUCCESS
        }
        Err(e) => report(&e),
    }
}

/// Warm up windows from history ending at `as_of` and rank once.
///
/// The ranking day is the latest trading date in the loaded data on or
/// before `as_of`. Only listings with a bar on that day are tradable; the
/// rest keep their windows but get no allocation.
pub fn rank_as_of(
    data_port: &dyn DataPort,
    bt_config: &BacktestConfig,
    codes: Option<&[String]>,
    as_of: NaiveDate,
) -> Result<Ranking, MadError> {
    let lookback = BacktestConfig {
        start_date: as_of,
        ..bt_config.clone()
    }
    .warmup_start();

    let listings = discover_listings(data_port, &bt_config.universe.exchanges, codes)?;
    let code_data = load_code_data(data_port, &listings, lookback, as_of);
    let ranking_day = match code_data
        .iter()
        .filter_map(|cd| cd.ohlcv.last().map(|bar| bar.date))
        .max()
    {
        Some(day) => day,
        None => {
            return Err(MadError::NoData {
                code: "all".into(),
                exchange: bt_config.universe.exchanges.join(","),
            });
        }
    };

    let mut history =
        PriceHistory::new(bt_config.mad.long_period).map_err(|e| MadError::ConfigInvalid {
            section: "strategy".into(),
            key: "long_period".into(),
            reason: e.to_string(),
        })?;
    let mut latest: Vec<&OhlcvBar> = Vec::with_capacity(code_data.len());
    for cd in &code_data {
        let closes: Vec<f64> = cd.ohlcv.iter().map(|bar| bar.close).collect();
        history.warm_up(&cd.code, &closes);
        match cd.ohlcv.last() {
            Some(bar) if bar.date == ranking_day => latest.push(bar),
            Some(bar) => {
                warn!(code = %cd.code, last = %bar.date, %ranking_day, "no bar on ranking day, excluded")
            }
            None => {}
        }
    }
    if ranking_day != as_of {
        info!(%as_of, %ranking_day, "ranking on latest trading day");
    }

    Ok(compute_targets(&latest, &history, bt_config))
}

fn print_ranking(as_of: NaiveDate, ranking: &Ranking) {
    eprintln!(
        "Ranking as of {}: {} candidates, {} with MAD",
        as_of,
        ranking.candidates.len(),
        ranking.readings.len()
    );
    println!("code,ma_short,ma_long,mad,weight");
    for (code, reading) in &ranking.readings {
        println!(
            "{},{:.4},{:.4},{:.4},{:.6}",
            code,
            reading.ma_short,
            reading.ma_long,
            reading.mad,
            ranking.targets.get(code)
        );
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_validated(config_path) {
        Ok(a) => a,
        Err(e) => return report(&e),
    };
    if let Err(e) = build_backtest_config(&adapter) {
        return report(&e);
    }
    if let Err(e) = resolve_codes(None, &adapter) {
        return report(&e);
    }
    eprintln!("Configuration is valid.");
    ExitCode::SUCCESS
}

fn exchanges_for(exchange: Option<&str>, config: &dyn ConfigPort) -> Result<Vec<String>, MadError> {
    match exchange {
        Some(e) => Ok(vec![e.to_uppercase()]),
        None => Ok(build_universe_params(config)?.exchanges),
    }
}

fn run_list_symbols(config_path: &Path, exchange: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return report(&e),
    };
    let prepared = exchanges_for(exchange, &config)
        .and_then(|ex| Ok((ex, data_adapter(&config)?)));
    let (exchanges, adapter) = match prepared {
        Ok(p) => p,
        Err(e) => return report(&e),
    };

    let mut found = 0usize;
    for exchange in &exchanges {
        let symbols = match adapter.list_symbols(exchange) {
            Ok(s) => s,
            Err(e) => return report(&e),
        };
        for symbol in &symbols {
            println!("{}.{}", symbol, exchange);
        }
        found += symbols.len();
    }

    if found == 0 {
        eprintln!("No symbols found for {}", exchanges.join(", "));
    } else {
        eprintln!("{} symbols found", found);
    }
    ExitCode::SUCCESS
}

fn run_info(config_path: &Path, code: Option<&str>, exchange: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return report(&e),
    };
    let prepared = exchanges_for(exchange, &config)
        .and_then(|ex| Ok((ex, resolve_codes(code, &config)?)))
        .and_then(|(ex, codes)| Ok((ex, codes, data_adapter(&config)?)));
    let (exchanges, codes, adapter) = match prepared {
        Ok(p) => p,
        Err(e) => return report(&e),
    };

    let listings = match discover_listings(&adapter, &exchanges, codes.as_deref()) {
        Ok(l) => l,
        Err(e) => return report(&e),
    };

    for listing in &listings {
        match adapter.get_data_range(&listing.code, &listing.exchange) {
            Ok(Some((min_date, max_date, count))) => {
                println!(
                    "{}.{}: {} bars, {} to {}",
                    listing.code, listing.exchange, count, min_date, max_date
                );
            }
            Ok(None) => eprintln!("{}.{}: no data found", listing.code, listing.exchange),
            Err(e) => eprintln!(
                "error querying {}.{}: {}",
                listing.code, listing.exchange, e
            ),
        }
    }
    ExitCode::SUCCESS
}
