mod commands;
mod error;
mod services;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use leadflow_config::{AppConfig, CONFIG_PATH_ENV, USE_TEST_WEBHOOKS_ENV};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use crate::commands::Commands;
use crate::error::{CliError, Result};

#[derive(Parser)]
#[command(name = "leadflow")]
#[command(about = "Run lead conversion, package completion and invoicing triggers", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (default: $LEADFLOW_CONFIG, else built-in defaults)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// JSON document holding the record store tables
    #[arg(long, global = true, default_value = "leadflow-records.json")]
    store: PathBuf,

    /// Call the test webhook endpoints instead of production
    #[arg(long, global = true)]
    use_test_webhooks: bool,

    /// Log more detail to stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match load_config(cli.config, cli.use_test_webhooks) {
        Ok(config) => config,
        Err(e) => {
            print_error(&e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = cli.command.execute(&config, &cli.store).await {
        print_error(&e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<PathBuf>, use_test_webhooks: bool) -> Result<AppConfig> {
    let path = path.or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));
    let config = match path {
        Some(path) => {
            debug!(path = %path.display(), "loading configuration");
            AppConfig::load(&path).map_err(CliError::Config)?
        }
        None => AppConfig::default(),
    };

    let forced = use_test_webhooks || env_flag(USE_TEST_WEBHOOKS_ENV);
    Ok(if forced {
        config.with_use_test_webhooks(true)
    } else {
        config
    })
}

/// Set and not one of `0`, `false`, `no` or empty.
fn env_flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|value| {
        let value = value.trim();
        !(value.is_empty()
            || value == "0"
            || value.eq_ignore_ascii_case("false")
            || value.eq_ignore_ascii_case("no"))
    })
}

fn print_error(error: &CliError) {
    eprintln!("error: {error}");

    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("caused by: {cause}");
        source = std::error::Error::source(cause);
    }
}
