// tablematch CLI - reconcile two tables by priority-ordered matching rules

mod exit_codes;
mod logging;
mod recon;

use std::process::ExitCode;

use clap::{ArgAction, Parser};

use exit_codes::{EXIT_ERROR, EXIT_SUCCESS};
use recon::ReconCommands;

#[derive(Parser)]
#[command(name = "tmatch")]
#[command(about = "Reconcile two tables with priority-ordered composite-key rules")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors and skip the run summary
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: ReconCommands,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("TMATCH_REVISION"), ")",
        "\nbuild:   ", env!("TMATCH_PROFILE"),
        "\ntarget:  ", env!("TMATCH_TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = logging::init(cli.verbose, cli.quiet)
        .map_err(|message| CliError {
            code: EXIT_ERROR,
            message,
            hint: None,
        })
        .and_then(|()| recon::cmd_recon(cli.command, cli.quiet));

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
