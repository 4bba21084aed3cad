//! Startup flags and configuration.
//!
//! The session flags (`-a`, `--hide`, `-o`, `-q`, `-v`) mirror the
//! interactive commands of the same name and are applied in the order they
//! were given, so `-a --hide` leaves hidden entities hidden. `-h` and `-V`
//! print help or the version and end the run.

use std::ffi::OsString;
use std::io::Write;
use std::time::Duration;

use clap::parser::ValueSource;
use clap::{ArgAction, CommandFactory, FromArgMatches, Parser};

use crate::client::validate_url;
use crate::error::CliError;
use crate::session::{Session, Verbosity};
use crate::usage::USAGE;

/// Controller used when none is configured.
pub const DEFAULT_CONTROLLER: &str = "ws://localhost:6817";

/// Environment variable that pre-sets the `all` flag when present.
pub const ALL_ENV: &str = "CLAWCTL_ALL";

/// Administration client for the Clawbernetes controller.
#[derive(Parser, Debug, Clone)]
#[command(name = "clawctl", about, long_about = None)]
#[command(disable_help_flag = true, disable_version_flag = true)]
pub struct Cli {
    /// Equivalent to the "all" command.
    #[arg(short, long, action = ArgAction::Append, num_args = 0, default_missing_value = "true")]
    pub all: Vec<bool>,

    /// Equivalent to the "help" command.
    #[arg(short, long, action = ArgAction::Append, num_args = 0, default_missing_value = "true")]
    pub help: Vec<bool>,

    /// Equivalent to the "hide" command.
    #[arg(long, action = ArgAction::Append, num_args = 0, default_missing_value = "true")]
    pub hide: Vec<bool>,

    /// Equivalent to the "oneliner" command.
    #[arg(short, long, action = ArgAction::Append, num_args = 0, default_missing_value = "true")]
    pub oneliner: Vec<bool>,

    /// Equivalent to the "quiet" command.
    #[arg(short, long, action = ArgAction::Append, num_args = 0, default_missing_value = "true")]
    pub quiet: Vec<bool>,

    /// Equivalent to the "verbose" command.
    #[arg(short, long, action = ArgAction::Append, num_args = 0, default_missing_value = "true")]
    pub verbose: Vec<bool>,

    /// Equivalent to the "version" command.
    #[arg(short = 'V', long, action = ArgAction::Append, num_args = 0, default_missing_value = "true")]
    pub version: Vec<bool>,

    /// Primary controller URL.
    #[arg(long, env = "CLAWCTL_CONTROLLER", default_value = DEFAULT_CONTROLLER)]
    pub controller: String,

    /// Backup controller URL.
    #[arg(long, env = "CLAWCTL_BACKUP_CONTROLLER")]
    pub backup_controller: Option<String>,

    /// Controller request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Command to run instead of reading commands interactively.
    #[arg(trailing_var_arg = true)]
    pub command: Vec<String>,
}

/// A session flag given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupFlag {
    /// `-a`, `--all`
    All,
    /// `-h`, `--help`
    Help,
    /// `--hide`
    Hide,
    /// `-o`, `--oneliner`
    OneLiner,
    /// `-q`, `--quiet`
    Quiet,
    /// `-v`, `--verbose`
    Verbose,
    /// `-V`, `--version`
    Version,
}

const FLAG_IDS: &[(&str, StartupFlag)] = &[
    ("all", StartupFlag::All),
    ("help", StartupFlag::Help),
    ("hide", StartupFlag::Hide),
    ("oneliner", StartupFlag::OneLiner),
    ("quiet", StartupFlag::Quiet),
    ("verbose", StartupFlag::Verbose),
    ("version", StartupFlag::Version),
];

impl Cli {
    /// Parse arguments, also returning the session flags in the order given.
    ///
    /// Every occurrence is kept, so `-h -V` reports `Help` first.
    ///
    /// # Errors
    ///
    /// Returns clap's error for unknown options or bad values.
    pub fn parse_ordered<I, T>(args: I) -> Result<(Self, Vec<StartupFlag>), clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command().try_get_matches_from(args)?;
        let cli = Self::from_arg_matches(&matches)?;
        let mut flags: Vec<(usize, StartupFlag)> = FLAG_IDS
            .iter()
            .filter(|&&(id, _)| matches.value_source(id) == Some(ValueSource::CommandLine))
            .flat_map(|&(id, flag)| {
                matches
                    .indices_of(id)
                    .into_iter()
                    .flatten()
                    .map(move |index| (index, flag))
            })
            .collect();
        flags.sort_by_key(|&(index, _)| index);
        Ok((cli, flags.into_iter().map(|(_, flag)| flag).collect()))
    }
}

/// Whether the run continues after the startup flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupAction {
    /// Go on to the command or the interactive loop.
    Run,
    /// `-h` or `-V` was handled; stop.
    Exit,
}

/// Apply startup flags to `session` in order.
///
/// # Errors
///
/// Returns an error if help or version output cannot be written.
pub fn apply_startup_flags(
    flags: &[StartupFlag],
    session: &mut Session,
    out: &mut dyn Write,
) -> Result<StartupAction, CliError> {
    for flag in flags {
        match flag {
            StartupFlag::All => session.all = true,
            StartupFlag::Hide => session.all = false,
            StartupFlag::OneLiner => session.one_liner = true,
            StartupFlag::Quiet => session.verbosity = Verbosity::Quiet,
            StartupFlag::Verbose => session.verbosity = Verbosity::Verbose,
            StartupFlag::Help => {
                out.write_all(USAGE.as_bytes())?;
                return Ok(StartupAction::Exit);
            }
            StartupFlag::Version => {
                writeln!(out, "clawctl {}", env!("CARGO_PKG_VERSION"))?;
                return Ok(StartupAction::Exit);
            }
        }
    }
    Ok(StartupAction::Run)
}

/// Resolved controller settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Primary controller URL.
    pub controller: String,
    /// Backup controller URL.
    pub backup_controller: Option<String>,
    /// Request timeout.
    pub request_timeout: Duration,
}

impl Config {
    /// Build and validate the configuration from parsed arguments.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] for a non-WebSocket URL or a zero
    /// timeout.
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        validate_url(&cli.controller)?;
        if let Some(url) = &cli.backup_controller {
            validate_url(url)?;
        }
        if cli.timeout == 0 {
            return Err(CliError::Config("timeout must be at least one second".into()));
        }
        Ok(Self {
            controller: cli.controller.clone(),
            backup_controller: cli.backup_controller.clone(),
            request_timeout: Duration::from_secs(cli.timeout),
        })
    }
}
