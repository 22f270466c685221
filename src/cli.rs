//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use log::info;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_ledger_adapter::CsvLedgerAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config::RunConfig;
use crate::domain::config_validation::validate_config;
use crate::domain::error::TradesysError;
use crate::domain::metrics::{Metrics, SymbolResult};
use crate::domain::runner::run_systems;
use crate::domain::simulator::SimulationResult;
use crate::domain::strategy::{SYSTEM_NAMES, TradingSystem, create_system};
use crate::domain::universe::{load_market_data, resolve_universe};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::ledger_port::LedgerPort;

#[derive(Parser, Debug)]
#[command(name = "tradesys", about = "Multi-system daily-bar portfolio backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one system, or all seven, and write their ledgers
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// system1..system7, or "all"
        #[arg(short, long, default_value = "all")]
        system: String,
        /// Overrides [output] dir
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Validate and print the plan without loading data
        #[arg(long)]
        dry_run: bool,
    },
    /// List symbols available in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for symbol(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        /// Single symbol; defaults to the configured universe
        #[arg(long)]
        symbol: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            system,
            output,
            dry_run,
        } => run_backtest(&config, &system, output.as_deref(), dry_run),
        Command::ListSymbols { config } => run_list_symbols(&config),
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, symbol } => run_info(&config, symbol.as_deref()),
    };
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn load_config(path: &Path) -> Result<FileConfigAdapter, TradesysError> {
    eprintln!("Loading config from {}", path.display());
    let adapter = FileConfigAdapter::from_file(path)?;
    validate_config(&adapter)?;
    Ok(adapter)
}

/// The requested systems with per-system overrides applied, each once in
/// first-named order.
pub fn build_systems(
    selection: &str,
    config: &dyn ConfigPort,
    run: &RunConfig,
) -> Result<Vec<Box<dyn TradingSystem>>, TradesysError> {
    let names: Vec<&str> = if selection.trim().eq_ignore_ascii_case("all") {
        SYSTEM_NAMES.to_vec()
    } else {
        selection.split(',').map(str::trim).collect()
    };
    let mut seen = HashSet::new();
    let mut systems = Vec::new();
    for name in names {
        let system = create_system(name, config, run.risk)?;
        // a repeated name would rerun the system and overwrite its ledger
        if seen.insert(system.name()) {
            systems.push(system);
        }
    }
    Ok(systems)
}

fn run_backtest(
    config_path: &Path,
    selection: &str,
    output: Option<&Path>,
    dry_run: bool,
) -> Result<ExitCode, TradesysError> {
    let adapter = load_config(config_path)?;
    let mut run = RunConfig::from_port(&adapter)?;
    if let Some(dir) = output {
        run.output_dir = dir.to_path_buf();
    }
    let systems = build_systems(selection, &adapter, &run)?;

    if dry_run {
        print_plan(&systems, &run);
        eprintln!("\nDry run complete: configuration is valid");
        return Ok(ExitCode::SUCCESS);
    }

    let data_port = CsvAdapter::new(run.data_path.clone());
    let universe = resolve_universe(&data_port, run.symbols.as_deref(), &run.market_symbol)?;
    eprintln!(
        "Loading {} symbols (+ {}) from {}",
        universe.count(),
        universe.market_symbol,
        run.data_path.display()
    );
    let data = load_market_data(&data_port, &universe, run.start_date, run.end_date, run.threads)?;

    eprintln!("Running {} system(s)", systems.len());
    let results = run_systems(&systems, &data, &run);

    let ledger = CsvLedgerAdapter::new(run.output_dir.clone());
    let mut first_error: Option<TradesysError> = None;
    for (name, result) in results {
        match result {
            Ok(result) => {
                print_summary(&result);
                let path = ledger.write_ledger(&result)?;
                ledger.write_capital_log(&result)?;
                eprintln!("Ledger written to: {}", path.display());
            }
            Err(e) => {
                eprintln!("error: {name}: {e}");
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Ok((&e).into()),
        None => Ok(ExitCode::SUCCESS),
    }
}

fn print_plan(systems: &[Box<dyn TradingSystem>], run: &RunConfig) {
    eprintln!("\nData:");
    eprintln!("  path:   {}", run.data_path.display());
    eprintln!(
        "  symbols: {}",
        run.symbols.as_deref().unwrap_or("(every CSV in path)")
    );
    eprintln!("  market: {}", run.market_symbol);
    eprintln!("  initial capital: {:.2}", run.initial_capital);

    eprintln!("\nSystems:");
    for system in systems {
        let risk = system.risk();
        let mut columns: Vec<String> = system.columns().iter().map(|c| c.to_string()).collect();
        columns.sort();
        eprintln!(
            "  {} ({}): min {} bars, risk {:.3}, cap {:.2}, {} slots, top {}",
            system.name(),
            system.side(),
            system.min_bars(),
            risk.risk_pct,
            risk.max_position_pct,
            risk.max_positions,
            risk.top_n
        );
        eprintln!("    indicators: {}", columns.join(", "));
    }
}

fn print_summary(result: &SimulationResult) {
    let metrics = Metrics::compute(result);

    eprintln!("\n=== {} ===", result.system);
    eprintln!("Total Trades:     {}", metrics.total_trades);
    eprintln!("Total PnL:        {:.2}", metrics.total_pnl);
    eprintln!("Final Capital:    {:.2}", metrics.final_capital);
    eprintln!("Total Return:     {:.2}%", metrics.total_return * 100.0);
    eprintln!("Win Rate:         {:.1}%", metrics.win_rate * 100.0);
    eprintln!("Profit Factor:    {:.2}", metrics.profit_factor);
    eprintln!("Avg Win / Loss:   {:.2} / {:.2}", metrics.avg_win, metrics.avg_loss);
    eprintln!("Max Drawdown:     {:.2}", metrics.max_drawdown);
    if result.rejected() > 0 {
        eprintln!("Rejected:         {}", result.rejected());
        for (reason, count) in &result.rejections {
            eprintln!("  {}: {}", reason, count);
        }
    }

    let per_symbol = SymbolResult::compute_per_symbol(&result.trades);
    for row in per_symbol.iter().take(5) {
        let pnl_sign = if row.total_pnl >= 0.0 { "+" } else { "" };
        eprintln!(
            "  {}:  {} trades, {:.1}% win rate, {}${:.0}",
            row.symbol,
            row.total_trades,
            row.win_rate * 100.0,
            pnl_sign,
            row.total_pnl,
        );
    }
}

fn run_list_symbols(config_path: &Path) -> Result<ExitCode, TradesysError> {
    let adapter = load_config(config_path)?;
    let run = RunConfig::from_port(&adapter)?;
    let symbols = CsvAdapter::new(run.data_path.clone()).list_symbols()?;

    if symbols.is_empty() {
        eprintln!("No symbols found in {}", run.data_path.display());
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    Ok(ExitCode::SUCCESS)
}

fn run_validate(config_path: &Path) -> Result<ExitCode, TradesysError> {
    let adapter = load_config(config_path)?;
    let run = RunConfig::from_port(&adapter)?;
    let systems = build_systems("all", &adapter, &run)?;
    info!("validated {} system configurations", systems.len());
    eprintln!("Configuration is valid.");
    Ok(ExitCode::SUCCESS)
}

fn run_info(config_path: &Path, symbol: Option<&str>) -> Result<ExitCode, TradesysError> {
    let adapter = load_config(config_path)?;
    let run = RunConfig::from_port(&adapter)?;
    let data_port = CsvAdapter::new(run.data_path.clone());

    let symbols = match symbol {
        Some(s) => vec![s.trim().to_uppercase()],
        None => resolve_universe(&data_port, run.symbols.as_deref(), &run.market_symbol)?.symbols,
    };

    for s in &symbols {
        match data_port.get_data_range(s) {
            Ok(Some((first, last, count))) => println!("{}: {} bars, {} to {}", s, count, first, last),
            Ok(None) => eprintln!("{}: no data found", s),
            Err(e) => eprintln!("error querying {}: {}", s, e),
        }
    }
    Ok(ExitCode::SUCCESS)
}
