#![forbid(unsafe_code)]

mod cmd;
mod output;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use huddle_core::config::resolve_config;
use huddle_core::error::ErrorCode;
use output::{CliError, OutputMode, render_error};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "huddle: team voice-communication network analytics",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Only log warnings and errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Project root holding `.huddle/` (defaults to the current directory).
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn log_level(&self) -> LogLevel {
        if self.quiet {
            LogLevel::Quiet
        } else if self.verbose || env::var("DEBUG").is_ok() {
            LogLevel::Verbose
        } else {
            LogLevel::Normal
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogLevel {
    Quiet,
    Normal,
    Verbose,
}

impl LogLevel {
    const fn default_filter(self) -> &'static str {
        match self {
            Self::Quiet => "warn",
            Self::Normal => "huddle=info,warn",
            Self::Verbose => "huddle=debug,info",
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Ingest",
        about = "Import a match folder",
        long_about = "Parse a match folder (info.csv, da_result.csv and optional transcript) into the store, then compute its metrics.",
        after_help = "EXAMPLES:\n    # Import and analyze\n    huddle import data/match-01\n\n    # Override the match code and skip analysis\n    huddle import data/match-01 --match-code KR-2024-17 --no-analyze"
    )]
    Import(cmd::import::ImportArgs),

    #[command(
        next_help_heading = "Ingest",
        about = "Recompute metrics for a match",
        long_about = "Recompute every windowed metric record of a match and replace the stored set atomically.",
        after_help = "EXAMPLES:\n    # Re-run analysis\n    huddle analyze 3\n\n    # Emit machine-readable output\n    huddle analyze 3 --json"
    )]
    Analyze(cmd::analyze::AnalyzeArgs),

    #[command(
        next_help_heading = "Read",
        about = "List imported matches",
        after_help = "EXAMPLES:\n    # List matches, newest first\n    huddle matches\n\n    # Emit machine-readable output\n    huddle matches --json"
    )]
    Matches(cmd::matches::MatchesArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show one match in detail",
        long_about = "Show a match's summary, its roster and every utterance of its voice log in start order.",
        after_help = "EXAMPLES:\n    # Roster and voice log\n    huddle show 3\n\n    # Emit machine-readable output\n    huddle show 3 --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show per-window metrics",
        long_about = "Show per-window metric records for one dialogue-act transition (question then inform by default).",
        after_help = "EXAMPLES:\n    # Directive followed by confirm\n    huddle metrics 3 --source-da 2 --target-da 3\n\n    # Live view over every utterance\n    huddle metrics 3 --source-da -1 --target-da -1"
    )]
    Metrics(cmd::metrics::MetricsArgs),

    #[command(
        next_help_heading = "Read",
        about = "Density over a time range",
        long_about = "Compute interaction density between two offsets (whole seconds) of a match.",
        after_help = "EXAMPLES:\n    # Any transition in the first minute\n    huddle range 3 --start 0 --end 60\n\n    # Questions answered by information\n    huddle range 3 --start 0 --end 60 --source-da 1 --target-da 0"
    )]
    Range(cmd::range::RangeArgs),

    #[command(
        next_help_heading = "Project Maintenance",
        about = "Generate shell completion scripts",
        long_about = "Generate shell completion scripts for supported shells.",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    huddle completions bash\n\n    # Generate zsh completions\n    huddle completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

/// Logs go to stderr so stdout stays parseable in JSON mode.
fn init_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_env("HUDDLE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(level.default_filter()));

    let format = env::var("HUDDLE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

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

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level());

    if let Commands::Completions(args) = &cli.command {
        let mut command = Cli::command();
        return match cmd::completions::run_completions(args.shell, &mut command) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => fail(OutputMode::Text, &CliError::from_anyhow(&err)),
        };
    }

    let early_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };

    let root = match cli.root.clone().map_or_else(env::current_dir, Ok) {
        Ok(root) => root,
        Err(err) => {
            let error = CliError::new(format!("cannot determine project root: {err}"))
                .with_code(ErrorCode::InternalUnexpected);
            return fail(early_mode, &error);
        }
    };

    let effective = match resolve_config(&root, cli.json) {
        Ok(effective) => effective,
        Err(err) => {
            let code = ErrorCode::ConfigParseError;
            let error = CliError::new(format!("{}: {err:#}", code.message())).with_code(code);
            return fail(early_mode, &error);
        }
    };

    let ctx = cmd::Context {
        root,
        config: effective.project,
        output: OutputMode::from_name(&effective.resolved_output),
    };
    debug!(root = %ctx.root.display(), output = ?ctx.output, "context resolved");

    let result = match &cli.command {
        Commands::Import(args) => cmd::import::run_import(args, &ctx),
        Commands::Analyze(args) => cmd::analyze::run_analyze(args, &ctx),
        Commands::Matches(args) => cmd::matches::run_matches(args, &ctx),
        Commands::Show(args) => cmd::show::run_show(args, &ctx),
        Commands::Metrics(args) => cmd::metrics::run_metrics(args, &ctx),
        Commands::Range(args) => cmd::range::run_range(args, &ctx),
        Commands::Completions(_) => Ok(()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fail(ctx.output, &CliError::from_anyhow(&err)),
    }
}

fn fail(mode: OutputMode, error: &CliError) -> ExitCode {
    if render_error(mode, error).is_err() {
        eprintln!("error: {}", error.message);
    }
    ExitCode::FAILURE
}
