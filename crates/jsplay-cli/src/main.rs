use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;

use clap::{Parser, Subcommand};
use jsplay_sandbox::samples::{self, SAMPLES};
use jsplay_sandbox::{
    EditorConfig, EditorSession, HostConsole, RunReport, RunResult, SandboxError, TimerQueue,
};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to an editor config file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a snippet file (`-` reads standard input)
    Run(RunArgs),

    /// Run one of the built-in samples
    Sample {
        /// Sample index or exact title
        key: String,

        #[command(flatten)]
        options: RunOptions,
    },

    /// List the built-in samples
    Samples,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Snippet file
    file: PathBuf,

    #[command(flatten)]
    options: RunOptions,
}

#[derive(clap::Args)]
struct RunOptions {
    /// After the run, advance the virtual clock this many milliseconds so
    /// pending timers fire
    #[arg(long, default_value_t = 0.0)]
    drain_timers: f64,

    /// Print the result as a JSON report
    #[arg(long)]
    json: bool,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no sample named '{0}'")]
    UnknownSample(String),

    #[error("failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(fmt::layer().with_writer(io::stderr))
        .init();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether the snippet succeeded.
fn run(cli: &Cli) -> Result<bool, CliError> {
    let config = match &cli.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };
    debug!(?config, "config loaded");

    match &cli.command {
        Commands::Run(args) => {
            let code = read_source(&args.file)?;
            execute(config, code, &args.options)
        }
        Commands::Sample { key, options } => {
            let sample = samples::find(key).ok_or_else(|| CliError::UnknownSample(key.clone()))?;
            info!(title = sample.title, "running sample");
            execute(config, sample.code.to_string(), options)
        }
        Commands::Samples => {
            for (index, sample) in SAMPLES.iter().enumerate() {
                println!("{index}: {} - {}", sample.title, sample.description);
            }
            Ok(true)
        }
    }
}

fn read_source(path: &Path) -> Result<String, CliError> {
    let read = if path.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text).map(|_| text)
    } else {
        std::fs::read_to_string(path)
    };
    read.map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn execute(config: EditorConfig, code: String, options: &RunOptions) -> Result<bool, CliError> {
    let console = HostConsole::stdio();
    let timers = TimerQueue::new(console.clone(), config.sandbox.limits());
    let mut session = EditorSession::new(config, console, Rc::new(timers.clone()));
    session.set_code(code);

    let result = session.run()?;
    if options.json {
        println!("{}", serde_json::to_string_pretty(&RunReport::from(&result))?);
    } else {
        match &result {
            RunResult::Succeeded(output) => println!("{output}"),
            RunResult::Failed(error) => eprintln!("{error}"),
        }
    }

    if options.drain_timers > 0.0 {
        let fired = timers.advance(options.drain_timers);
        info!(fired, pending = timers.pending(), "timers drained");
    }
    Ok(result.is_success())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_takes_a_file_and_run_options() {
        let cli = Cli::try_parse_from(["jsplay", "run", "snippet.js", "--drain-timers", "50", "--json"])
            .unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.file, PathBuf::from("snippet.js"));
                assert_eq!(args.options.drain_timers, 50.0);
                assert!(args.options.json);
            }
            _ => panic!("expected the run subcommand"),
        }
    }
}
