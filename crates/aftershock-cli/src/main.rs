#![forbid(unsafe_code)]

mod cmd;
mod output;

use std::env;
use std::process::ExitCode;

use aftershock_core::timing;
use clap::{Parser, Subcommand};
use output::{OutputMode, resolve_output_mode};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "ash: nearest-neighbor earthquake clustering",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit stage timing report to stderr.
    #[arg(long, global = true)]
    timing: bool,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    Cluster(cmd::cluster::ClusterArgs),
    Stats(cmd::stats::StatsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("AFTERSHOCK_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "aftershock=debug,info"
        } else {
            "aftershock=info,warn"
        })
    });

    let format = env::var("AFTERSHOCK_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let timing_enabled = cli.timing || timing::timing_enabled_from_env();
    timing::set_timing_enabled(timing_enabled);
    timing::clear_timings();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let output = cli.output_mode();
    let command_result = match cli.command {
        Commands::Cluster(ref args) => cmd::cluster::run_cluster(args, output),
        Commands::Stats(ref args) => cmd::stats::run_stats(args, output),
    };

    if timing_enabled {
        let report = timing::collect_report();
        if report.is_empty() {
            eprintln!("timing report: no samples recorded");
        } else {
            eprintln!("timing report:");
            eprintln!("{}", report.display_table());
            eprintln!("timing report (json):");
            eprintln!("{}", serde_json::to_string_pretty(&report.to_json())?);
        }
    }

    Ok(ExitCode::from(command_result?.exit_code()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_flag_parses_before_subcommand() {
        let cli = Cli::parse_from(["ash", "--timing", "stats", "--catalog", "c.json"]);
        assert!(cli.timing);
        assert!(matches!(cli.command, Commands::Stats(_)));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::parse_from(["ash", "cluster", "-c", "c.json", "--json", "--timing"]);
        assert!(cli.json);
        assert!(cli.timing);
        assert!(cli.output_mode().is_json());
    }

    #[test]
    fn format_flag_selects_mode() {
        let cli = Cli::parse_from(["ash", "--format", "text", "cluster", "-c", "c.json"]);
        assert_eq!(cli.output_mode(), OutputMode::Text);
    }

    #[test]
    fn cluster_args_parse() {
        let cli = Cli::parse_from([
            "ash",
            "cluster",
            "--catalog",
            "events.jsonl",
            "--threshold",
            "1e-7",
            "--distance",
            "haversine",
            "--workers",
            "4",
            "--start",
            "2019-07-01",
            "--limit",
            "5",
        ]);
        let Commands::Cluster(args) = cli.command else {
            panic!("expected cluster command");
        };
        assert!(args.catalog.threshold.is_some_and(|t| (t - 1e-7).abs() < 1e-12));
        assert_eq!(
            args.catalog.distance,
            Some(aftershock_core::DistanceKind::Haversine)
        );
        assert_eq!(args.catalog.workers, Some(4));
        assert_eq!(args.catalog.start.as_deref(), Some("2019-07-01"));
        assert_eq!(args.limit, Some(5));
    }

    #[test]
    fn unknown_distance_is_rejected() {
        let parsed =
            Cli::try_parse_from(["ash", "stats", "-c", "c.json", "--distance", "manhattan"]);
        assert!(parsed.is_err());
    }
}
