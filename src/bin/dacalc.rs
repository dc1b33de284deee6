//! Command-line front end for the blob cost calculator.
//!
//! `dacalc estimate` runs the full calculation against the configured offline
//! chain parameters, `dacalc plan` shows how a payload would be split, and
//! `dacalc price` (feature `net`) queries the token price.

use clap::{Args, Parser, Subcommand};
use da_calculator::{
    resolve_byte_size, CalcError, Calculator, CalculatorConfig, CapacityLimits, ChunkPlan,
    Estimate, Network,
};
use futures::executor::block_on;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dacalc", version, about = "Estimate the cost of submitting a data blob")]
struct Cli {
    /// JSON configuration file; environment variables override it.
    #[arg(short, long, global = true, env = "DACALC_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Estimate the fee for a payload or a size such as `512kb`.
    Estimate(EstimateArgs),
    /// Show how a payload splits into transactions and blocks, without quoting.
    Plan(PlanArgs),
    /// Print the current USD price of the token.
    #[cfg(feature = "net")]
    Price,
}

#[derive(Args, Debug)]
struct EstimateArgs {
    /// Payload or size token; `-` or nothing reads standard input.
    input: Option<String>,
    /// Read the payload from a file instead.
    #[arg(long, conflicts_with = "input")]
    file: Option<PathBuf>,
    /// Network preset (turing or mainnet).
    #[arg(long)]
    network: Option<String>,
    /// USD price per token used for conversion.
    #[arg(long)]
    usd_price: Option<f64>,
    /// Look the USD price up instead of passing it.
    #[cfg(feature = "net")]
    #[arg(long, conflicts_with = "usd_price")]
    fetch_price: bool,
    /// Print a JSON report.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct PlanArgs {
    /// Payload or size token.
    input: String,
    /// Override the per-transaction limit in bytes.
    #[arg(long)]
    max_per_tx: Option<u64>,
    /// Override the per-block limit in bytes.
    #[arg(long)]
    max_per_block: Option<u64>,
}

fn fatal(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let cfg = match &cli.config {
        Some(path) => CalculatorConfig::from_path(path),
        None => CalculatorConfig::from_env(),
    }
    .unwrap_or_else(|err| fatal(&err.to_string()));

    match cli.command {
        Command::Estimate(args) => cmd_estimate(cfg, args),
        Command::Plan(args) => cmd_plan(&cfg, args),
        #[cfg(feature = "net")]
        Command::Price => cmd_price(&cfg),
    }
}

fn read_input(args: &EstimateArgs) -> io::Result<Vec<u8>> {
    if let Some(path) = &args.file {
        return fs::read(path);
    }
    match args.input.as_deref() {
        Some("-") | None => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
        Some(text) => Ok(text.as_bytes().to_vec()),
    }
}

fn cmd_estimate(mut cfg: CalculatorConfig, args: EstimateArgs) {
    if let Some(name) = &args.network {
        cfg.network = Network::from_name(name)
            .unwrap_or_else(|| fatal(&format!("unknown network `{name}` (expected turing or mainnet)")));
    }
    let input = read_input(&args).unwrap_or_else(|err| fatal(&format!("failed to read input: {err}")));
    let chain = cfg.offline_chain();
    let mut calculator = Calculator::with_sender(cfg.sender());
    let estimate = block_on(calculator.calculate_bytes(&chain, &input))
        .unwrap_or_else(|err: CalcError| fatal(&err.to_string()));

    #[cfg(feature = "net")]
    let price = if args.fetch_price {
        fetch_price(&cfg)
    } else {
        args.usd_price
    };
    #[cfg(not(feature = "net"))]
    let price = args.usd_price;

    print_estimate(&estimate, price, args.json);
}

fn print_estimate(estimate: &Estimate, price: Option<f64>, json: bool) {
    if json {
        match serde_json::to_string_pretty(&estimate.report(price)) {
            Ok(text) => println!("{text}"),
            Err(err) => fatal(&format!("failed to encode report: {err}")),
        }
        return;
    }
    println!("Network: {}", estimate.network);
    println!("Payload: {} bytes", estimate.byte_size);
    for line in estimate.summary_lines(price) {
        println!("{line}");
    }
}

fn cmd_plan(cfg: &CalculatorConfig, args: PlanArgs) {
    let byte_size = resolve_byte_size(&args.input).unwrap_or_else(|err| fatal(&err.to_string()));
    let chain_limits = CapacityLimits::from_block_dimensions(
        cfg.chain.max_app_data_length,
        cfg.chain.block,
    )
    .unwrap_or_else(|err| fatal(&err.to_string()));
    let limits = CapacityLimits::new(
        args.max_per_tx.unwrap_or(chain_limits.max_per_transaction),
        args.max_per_block.unwrap_or(chain_limits.max_per_block),
    )
    .unwrap_or_else(|err| fatal(&err.to_string()));
    let plan = ChunkPlan::new(byte_size, &limits).unwrap_or_else(|err| fatal(&err.to_string()));
    match serde_json::to_string_pretty(&plan) {
        Ok(text) => println!("{text}"),
        Err(err) => fatal(&format!("failed to encode plan: {err}")),
    }
}

#[cfg(feature = "net")]
fn fetch_price(cfg: &CalculatorConfig) -> Option<f64> {
    use da_calculator::net::PriceClient;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|err| fatal(&format!("failed to start runtime: {err}")));
    let client =
        PriceClient::new(cfg.price.clone()).unwrap_or_else(|err| fatal(&err.to_string()));
    runtime.block_on(client.fetch()).price
}

#[cfg(feature = "net")]
fn cmd_price(cfg: &CalculatorConfig) {
    match fetch_price(cfg) {
        Some(price) => println!("{} = ${price}", cfg.price.symbol),
        None => println!("{} price unknown", cfg.price.symbol),
    }
}
