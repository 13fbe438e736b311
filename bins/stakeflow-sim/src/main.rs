//! stakeflow-sim: Command-line driver for the stakeflow reward engine.
//!
//! Prints the decaying reward schedule and replays staking scenarios
//! against an in-memory ledger.

mod scenario;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::DateTime;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use stakeflow_core::constants::TOKEN_UNIT;
use stakeflow_core::types::{Amount, Timestamp};
use stakeflow_feeder::{RewardSchedule, ScheduleParams};

use scenario::ScenarioConfig;

/// stakeflow reward engine simulator.
#[derive(Parser)]
#[command(name = "stakeflow-sim")]
#[command(version, about = "Multi-pool staking rewards simulator.")]
struct Cli {
    /// Log level filter (overridden by RUST_LOG).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format: text or json.
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the yearly and monthly reward budget.
    Schedule(ScheduleArgs),
    /// Replay a staking scenario and print a JSON report.
    Scenario(ScenarioArgs),
}

#[derive(Args)]
struct ScheduleArgs {
    /// Number of schedule years to print.
    #[arg(short, long, default_value = "10")]
    years: u64,

    /// Output format: text or json.
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Override the number of networks sharing the budget.
    #[arg(short, long)]
    networks: Option<u32>,
}

#[derive(Args)]
struct ScenarioArgs {
    /// JSON scenario file. Missing fields take defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, &cli.log_format);

    match cli.command {
        Commands::Schedule(args) => print_schedule(args),
        Commands::Scenario(args) => run_scenario(args),
    }
}

#[derive(Debug, Serialize)]
struct ScheduleRow {
    year: u64,
    starts_at: Timestamp,
    start_date: String,
    yearly_reward: Amount,
    monthly_reward: Amount,
}

fn schedule_rows(schedule: &RewardSchedule, years: u64) -> Result<Vec<ScheduleRow>> {
    (0..years)
        .map(|year| -> Result<ScheduleRow> {
            let starts_at = schedule.year_start(year);
            let yearly_reward = schedule.yearly_reward(starts_at)?;
            Ok(ScheduleRow {
                year,
                starts_at,
                start_date: format_date(starts_at),
                yearly_reward,
                monthly_reward: schedule.monthly_reward(starts_at)?,
            })
        })
        .collect()
}

fn print_schedule(args: ScheduleArgs) -> Result<()> {
    let mut params = ScheduleParams::default();
    if let Some(n) = args.networks {
        params.num_networks = n;
    }
    let schedule = RewardSchedule::new(params).context("invalid schedule parameters")?;
    let rows = schedule_rows(&schedule, args.years)?;
    info!(years = args.years, networks = params.num_networks, "schedule computed");

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&rows)?),
        "text" => {
            println!(
                "{:>4}  {:<10}  {:>22}  {:>22}",
                "year", "starts", "yearly", "monthly"
            );
            for row in &rows {
                println!(
                    "{:>4}  {:<10}  {:>22}  {:>22}",
                    row.year,
                    row.start_date,
                    format_tokens(row.yearly_reward),
                    format_tokens(row.monthly_reward)
                );
            }
            println!(
                "total over {} years: {}",
                args.years,
                format_tokens(schedule.cumulative_reward(args.years))
            );
        }
        other => bail!("Invalid format '{other}' (must be 'text' or 'json')"),
    }
    Ok(())
}

fn run_scenario(args: ScenarioArgs) -> Result<()> {
    let config = match args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str::<ScenarioConfig>(&raw)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => ScenarioConfig::default(),
    };

    let report = scenario::run(&config)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// UTC calendar date of a unix timestamp.
fn format_date(ts: Timestamp) -> String {
    i64::try_from(ts)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Format base units as whole tokens with six decimal places.
fn format_tokens(amount: Amount) -> String {
    let whole = amount / TOKEN_UNIT;
    let frac = (amount % TOKEN_UNIT) / (TOKEN_UNIT / 1_000_000);
    format!("{whole}.{frac:06}")
}

fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_anchor_date() {
        assert_eq!(format_date(1_567_296_000), "2019-09-01");
    }

    #[test]
    fn token_formatting() {
        assert_eq!(format_tokens(0), "0.000000");
        assert_eq!(format_tokens(1_250_000 * TOKEN_UNIT), "1250000.000000");
        assert_eq!(format_tokens(TOKEN_UNIT / 4), "0.250000");
    }

    #[test]
    fn rows_decay_yearly() {
        let schedule = RewardSchedule::default();
        let rows = schedule_rows(&schedule, 3).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].yearly_reward, 1_250_000 * TOKEN_UNIT);
        assert_eq!(rows[1].yearly_reward, rows[0].yearly_reward * 3 / 4);
        assert_eq!(rows[2].monthly_reward, rows[2].yearly_reward / 12);
        assert_eq!(rows[1].start_date, "2020-08-31");
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["stakeflow-sim", "schedule", "--years", "3", "--format", "json"])
            .unwrap();
        match cli.command {
            Commands::Schedule(args) => {
                assert_eq!(args.years, 3);
                assert_eq!(args.format, "json");
            }
            Commands::Scenario(_) => panic!("wrong subcommand"),
        }
    }
}
