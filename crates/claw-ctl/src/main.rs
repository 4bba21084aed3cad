//! `clawctl` binary entrypoint.

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use anyhow::Context as _;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use claw_ctl::cli::{apply_startup_flags, StartupAction, ALL_ENV};
use claw_ctl::input::{EditorLines, ReaderLines};
use claw_ctl::{Cli, Config, Interpreter, RemoteController, Session};

fn main() -> ExitCode {
    let (cli, flags) = match Cli::parse_ordered(std::env::args_os()) {
        Ok(parsed) => parsed,
        Err(e) => e.exit(),
    };

    // -v also turns on this crate's debug logs; RUST_LOG overrides.
    let default_directive = if cli.verbose.is_empty() { "warn" } else { "warn,claw_ctl=debug" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .with_writer(io::stderr)
        .init();

    let mut session = Session::new();
    session.all = std::env::var_os(ALL_ENV).is_some();

    match run(&cli, &flags, session) {
        Ok(status) => ExitCode::from(status),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(
    cli: &Cli,
    flags: &[claw_ctl::cli::StartupFlag],
    mut session: Session,
) -> anyhow::Result<u8> {
    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut out = stdout.lock();
    let mut err = stderr.lock();

    if apply_startup_flags(flags, &mut session, &mut out)? == StartupAction::Exit {
        return Ok(session.exit_status());
    }

    let config = Config::from_cli(cli).context("invalid configuration")?;
    debug!(?config, "starting");
    let mut controller = RemoteController::new(config.controller, config.backup_controller)
        .context("cannot set up controller client")?
        .with_request_timeout(config.request_timeout);

    let mut interpreter = Interpreter::new(session, &mut controller);
    if cli.command.is_empty() {
        let stdin = io::stdin();
        if stdin.is_terminal() {
            let mut source = EditorLines::new().context("cannot open terminal")?;
            interpreter.run_interactive(&mut source, &mut out, &mut err);
        } else {
            let mut source = ReaderLines::new(stdin.lock());
            interpreter.run_interactive(&mut source, &mut out, &mut err);
        }
    } else {
        interpreter.run_once(&cli.command, &mut out, &mut err);
    }

    Ok(interpreter.into_session().exit_status())
}
