mod commands;
mod helpers;

use clap::Parser;
use sombrero_core::domain::SombreroError;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let error = error.as_sombrero_error();
            eprintln!("{}", error.diagnostic_line());
            error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("sombrero".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();

    match Cli::try_parse_from(&full_args) {
        Ok(cli) => {
            init_logging(cli.log_level);
            dispatch_parsed(cli)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "sombrero",
    about = "Greyscale consensus and repair for scan project compilations"
)]
struct Cli {
    /// Log verbosity; RUST_LOG takes precedence when set
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    log_level: LogLevel,

    /// JSON file overriding the project file names
    #[arg(long, value_name = "FILE", global = true)]
    layout: Option<PathBuf>,

    /// Project directory holding the compilation and fixture config
    #[arg(value_name = "PROJECT_DIR")]
    project_dir: PathBuf,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Greyscale value maintenance
    #[command(subcommand)]
    Greyscale(GreyscaleCommand),
}

#[derive(clap::Subcommand)]
enum GreyscaleCommand {
    /// Fill in missing greyscale values in the compilation
    Interpolate(commands::InterpolateArgs),
    /// Put the compilation back from its pre-repair backup
    Restore,
    /// Emit the greyscale plot series as JSON
    Visualize(commands::VisualizeArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

fn init_logging(level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    // Logs go to stderr; stdout carries command output.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn dispatch_parsed(cli: Cli) -> Result<i32, CliError> {
    let layout = helpers::resolve_layout(&cli.project_dir, cli.layout.as_deref())?;
    match cli.command {
        CliCommand::Greyscale(GreyscaleCommand::Interpolate(args)) => {
            commands::run_interpolate_command(&layout, args)
        }
        CliCommand::Greyscale(GreyscaleCommand::Restore) => commands::run_restore_command(&layout),
        CliCommand::Greyscale(GreyscaleCommand::Visualize(args)) => {
            commands::run_visualize_command(&layout, args)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Run(SombreroError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<SombreroError> for CliError {
    fn from(error: SombreroError) -> Self {
        Self::Run(error)
    }
}

impl CliError {
    fn as_sombrero_error(&self) -> SombreroError {
        match self {
            Self::Usage(message) => {
                SombreroError::input_validation("INPUT.CLI_USAGE", message.trim_end())
            }
            Self::Run(error) => error.clone(),
            Self::Internal(error) => SombreroError::internal("INTERNAL.CLI", format!("{error:#}")),
        }
    }
}
