//! drone-exporter - export Drone CI build history to a metrics store.

mod config;
mod progress;
mod shutdown;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use console::Term;
use drone_exporter::drone::DroneClient;
use drone_exporter::{ApiRateLimiter, Exporter};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, Overrides};
use crate::progress::ProgressReporter;

#[derive(Parser, Debug)]
#[command(name = "drone-exporter")]
#[command(version)]
#[command(about = "Export Drone CI build data to a stats database")]
#[command(
    long_about = "drone-exporter polls a Drone CI server for builds that have not been \
recorded yet, flattens each build into build, stage and step points, and writes them \
to InfluxDB. It repeats every --interval minutes until interrupted."
)]
#[command(after_long_help = r#"EXAMPLES
    Run against a local InfluxDB:
        $ drone-exporter --drone-url https://drone.example.com --drone-token $TOKEN \
            --influxdb-address http://localhost:8086 --influxdb-database drone

    Use a config file with debug logging:
        $ drone-exporter --config /etc/drone-exporter/config.yml --debug debug

CONFIGURATION
    drone-exporter reads configuration from, highest priority first:
      1. Command-line flags and their environment variables
      2. DRONE_EXPORTER_* environment variables (e.g. DRONE_EXPORTER_EXPORTER__THREADS)
      3. The YAML file given by --config, or ./config.yml if present
      4. .env file in current directory
"#)]
struct Cli {
    /// Log level (trace, debug, info, warn, error); unknown values enable debug
    #[arg(short = 'd', long, env = "LOG_LEVEL", value_name = "LEVEL")]
    debug: Option<String>,

    /// Turn off all logging
    #[arg(short, long)]
    quiet: bool,

    /// YAML config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// How many repositories to process at the same time (default 4)
    #[arg(long, env = "THREADS")]
    threads: Option<usize>,

    /// Minutes to wait between cycles (default 15)
    #[arg(long, env = "INTERVAL")]
    interval: Option<u64>,

    /// Backend driver; influxdb is the only one supported
    #[arg(long, env = "DRIVER")]
    driver: Option<String>,

    /// InfluxDB address URL
    #[arg(long, env = "INFLUXDB_ADDRESS")]
    influxdb_address: Option<String>,

    /// InfluxDB database name
    #[arg(long, env = "INFLUXDB_DATABASE")]
    influxdb_database: Option<String>,

    /// InfluxDB username
    #[arg(long, env = "INFLUXDB_USERNAME")]
    influxdb_username: Option<String>,

    /// InfluxDB password
    #[arg(long, env = "INFLUXDB_PASSWORD", hide_env_values = true)]
    influxdb_password: Option<String>,

    /// Drone server URL
    #[arg(long, env = "DRONE_URL")]
    drone_url: Option<String>,

    /// Drone API token
    #[arg(long, env = "DRONE_TOKEN", hide_env_values = true)]
    drone_token: Option<String>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            threads: self.threads,
            interval: self.interval,
            driver: self.driver.clone(),
            influxdb_address: self.influxdb_address.clone(),
            influxdb_database: self.influxdb_database.clone(),
            influxdb_username: self.influxdb_username.clone(),
            influxdb_password: self.influxdb_password.clone(),
            drone_url: self.drone_url.clone(),
            drone_token: self.drone_token.clone(),
        }
    }
}

/// Filter directive for the requested level.
///
/// No level means `info`; a value that is not a tracing level means `debug`.
fn filter_directive(level: Option<&str>) -> String {
    let level = match level.map(str::trim).filter(|l| !l.is_empty()) {
        None => "info".to_string(),
        Some(l) => match l.parse::<tracing::Level>() {
            Ok(level) => level.to_string().to_lowercase(),
            Err(_) => "debug".to_string(),
        },
    };
    format!("drone_exporter={level},drone_exporter_cli={level}")
}

fn init_tracing(cli: &Cli) {
    if cli.quiet {
        return;
    }

    let requested = cli.debug.clone().or_else(|| std::env::var("DEBUG").ok());
    let env_filter = match requested {
        Some(level) => EnvFilter::new(filter_directive(Some(&level))),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(filter_directive(None))),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(Term::stderr().is_term())
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli);

    // Load configuration (flags -> env vars -> config file -> defaults)
    let config = Config::load(cli.config.as_deref(), &cli.overrides())?;
    config.validate()?;
    let options = config.exporter_options()?;

    let limiter = config.drone.requests_per_second.map(ApiRateLimiter::new);
    let client = DroneClient::new(
        &config.drone.url,
        &config.drone.token,
        limiter,
        config.request_timeout(),
    )?;

    let driver = config.driver()?;
    let store = driver.connect(&config.store_settings())?;

    tracing::info!(
        drone = %client.host(),
        driver = %driver,
        threads = options.threads,
        interval_minutes = config.exporter.interval,
        repos = options.repos.len(),
        "Starting drone-exporter"
    );

    let cancel = CancellationToken::new();
    shutdown::setup_shutdown_handler(cancel.clone());

    let reporter = Arc::new(ProgressReporter::new());
    let exporter = Exporter::new(Arc::new(client), Arc::clone(&store), options)
        .with_progress(reporter.as_callback());

    let result = exporter.run(cancel).await;

    if let Err(e) = store.close().await {
        tracing::warn!(error = %e, "Failed to close store");
    }

    if let Err(e) = result {
        tracing::error!(error = %e, "Exporter stopped");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
