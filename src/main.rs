use anyhow::Result;
use clap::Parser;
use ext_sort::{sort_files_by_extension, AppConfig, LogConfig, SortConfig, SortReport};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// Copy every file under a folder into per-extension subfolders
#[derive(Debug, Parser)]
#[command(name = "ext-sort", version, about)]
struct Cli {
    /// Source folder path
    #[arg(long, value_name = "PATH")]
    source: PathBuf,

    /// Output folder path
    #[arg(long, value_name = "PATH")]
    output: PathBuf,

    /// Maximum copies in flight at once (0 = unbounded)
    #[arg(long, value_name = "N", default_value_t = 64)]
    max_concurrency: usize,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error"]
    )]
    log_level: String,

    /// Write a JSON summary of the run to this file
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = create_app_config(Cli::parse());

    // Load .env before building the filter so RUST_LOG can come from it
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    initialize_logging(&config.log)?;

    if !dotenv_loaded {
        info!("No .env file found, using system environment variables");
    }

    run_application(config).await
}

fn create_app_config(cli: Cli) -> AppConfig {
    AppConfig {
        sort: SortConfig::new(cli.source, cli.output).with_max_concurrency(cli.max_concurrency),
        log: LogConfig {
            level: cli.log_level,
        },
        report: cli.report,
    }
}

/// Initialize structured logging with tracing
fn initialize_logging(config: &LogConfig) -> Result<()> {
    let level = match config.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

async fn run_application(config: AppConfig) -> Result<()> {
    info!("Configuration: {:?}", config);

    let report = sort_files_by_extension(&config.sort).await?;
    print_sort_report(&report);

    if let Some(path) = &config.report {
        report.write_json(path)?;
        info!("Report written to {}", path.display());
    }

    Ok(())
}

fn print_sort_report(report: &SortReport) {
    info!("=== SORT REPORT ===");
    info!("Files discovered: {}", report.files_discovered);
    info!("Successfully copied: {}", report.successful_copies);
    info!("Copy errors: {}", report.errors.len());
    info!("Destination collisions: {}", report.collisions.len());
    info!("Success rate: {:.2}%", report.success_rate() * 100.0);
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_rejects_unknown_log_level() {
        let result = Cli::try_parse_from([
            "ext-sort", "--source", "in", "--output", "out", "--log-level", "verbose",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_builds_app_config() {
        let cli = Cli::try_parse_from([
            "ext-sort",
            "--source",
            "in",
            "--output",
            "out",
            "--max-concurrency",
            "0",
            "--log-level",
            "debug",
            "--report",
            "run.json",
        ])
        .unwrap();

        let config = create_app_config(cli);

        assert_eq!(config.sort.source, PathBuf::from("in"));
        assert_eq!(config.sort.max_concurrency, 0);
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.report, Some(PathBuf::from("run.json")));
    }
}
