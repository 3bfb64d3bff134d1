use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use logreader_logs::{CompiledFilter, LogPump, LogSource, SourceError};
use logreader_remote::RemoteError;
use logreader_types::LOG_FILE_NAME;

mod config;
mod output;

use config::{FileConfig, RunConfig};
use output::ColorMode;

/// Logreader - Read and filter robot program logs in real time
#[derive(Parser, Debug)]
#[command(name = "logreader")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// FRC team number of the robot or simulation
    #[arg(value_name = "TEAM")]
    team: u32,

    /// Keep reading as new lines are logged
    #[arg(short, long)]
    follow: bool,

    /// Robot or simulation IP address
    #[arg(short, long)]
    ip: Option<String>,

    /// Read the log of a simulation running on this computer
    #[arg(short, long)]
    local_simulation: bool,

    /// Reach the robot by its mDNS name when no driver station is connected
    #[arg(short = 'd', long = "no-driverstation")]
    no_driverstation: bool,

    /// Comma-separated list of allowed log levels [default: INFO,WARNING]
    #[arg(short = 't', long, value_name = "LEVELS")]
    level_types: Option<String>,

    /// Comma-separated list of class names to show
    #[arg(short, long, value_name = "CLASSES")]
    classes: Option<String>,

    /// Comma-separated list of method names to show
    #[arg(short, long, value_name = "METHODS")]
    methods: Option<String>,

    /// Print the resolved configuration before reading
    #[arg(short, long)]
    verbose: bool,

    /// Config file (defaults to <config dir>/logreader/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Seconds to wait for the robot connection [default: 10]
    #[arg(long, value_name = "SECS")]
    connect_timeout: Option<u64>,

    /// Milliseconds between polls of a followed local file [default: 100]
    #[arg(long, value_name = "MS")]
    poll_interval_ms: Option<u64>,

    /// Color level labels
    #[arg(long, value_enum)]
    color: Option<ColorMode>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    init_tracing(args.verbose);

    let result = run(args).await;
    if let Err(e) = &result {
        report(e);
    }
    exit_code(&result)
}

/// Normal completion and interrupts exit 0; every error exits 1
fn exit_code(result: &Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

fn init_tracing(verbose: bool) {
    let default_directives = if verbose {
        "warn,logreader=debug,logreader_logs=debug,logreader_remote=debug"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directives)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args) -> Result<()> {
    let file_config = FileConfig::load(args.config.as_deref())?;
    let config = RunConfig::resolve(&args, file_config);
    let working_dir = std::env::current_dir()?;
    let spec = config.source_spec(&working_dir);

    if args.verbose {
        println!("Team: {}", config.target.team);
        println!("Ip address: {}", config.target.host);
        println!("Source: {spec}");
        println!("{}", config.filter);
    }

    // Ctrl-C ends the run normally
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::debug!("interrupt received");
                cancel.cancel();
            }
        });
    }

    let source = LogSource::open(&spec).await?;

    let mut pump = LogPump::new(CompiledFilter::new(config.filter), tokio::io::stdout());
    if config.color.enabled() {
        pump = pump.with_renderer(output::render_colored);
    }

    pump.run(source, &cancel).await?;
    Ok(())
}

/// Print an error, with a checklist when the user can act on it
fn report(error: &anyhow::Error) {
    for line in report_lines(error) {
        eprintln!("{line}");
    }
}

fn report_lines(error: &anyhow::Error) -> Vec<String> {
    match error.downcast_ref::<SourceError>() {
        Some(SourceError::SourceUnavailable { path }) => vec![
            format!("Error: could not find {}", path.display()),
            "Check that:".to_string(),
            "  - the simulation is running".to_string(),
            "  - logreader is run from the simulation's working directory".to_string(),
            format!("  - the robot program has written {LOG_FILE_NAME}"),
        ],
        Some(SourceError::Remote(RemoteError::Connection { host, stderr })) => vec![
            format!("Error: could not connect to {host}: {stderr}"),
            "Check that:".to_string(),
            "  - the robot is powered on and on this network".to_string(),
            "  - the team number (or --ip) is correct".to_string(),
            "  - a driver station is connected, or pass --no-driverstation".to_string(),
        ],
        Some(SourceError::Remote(RemoteError::Unavailable { binary, .. })) => vec![format!(
            "Error: the ssh client `{}` is not available; install OpenSSH to read robot logs",
            binary.display()
        )],
        _ => vec![format!("Error: {:#}", error)],
    }
}
