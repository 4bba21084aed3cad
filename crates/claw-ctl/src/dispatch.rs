//! Command table and dispatch.
//!
//! A command matches when the first word, ignoring case, is a prefix of its
//! name at least `min_abbrev` characters long. The table is searched in
//! order and the first match wins; the abbreviation lengths keep every
//! accepted prefix unambiguous (`quie` vs `quit`, `pid` vs `pin`).
//!
//! Arity counts the command word itself. Too few words fails the command
//! without running it. Too many words is reported and marks the session
//! failed, but the handler still runs on the first `max_args` words.

use std::io::Write;

use tracing::debug;

use crate::client::Controller;
use crate::commands;
use crate::error::CliError;
use crate::session::Session;

/// Everything a handler may touch.
pub struct Context<'a> {
    /// Session flags.
    pub session: &'a mut Session,
    /// Controller requests go here.
    pub controller: &'a mut dyn Controller,
    /// Normal output.
    pub out: &'a mut dyn Write,
    /// Diagnostics for the operator.
    pub err: &'a mut dyn Write,
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl Context<'_> {
    /// Report `err` and mark the session failed.
    ///
    /// Controller failures are not printed in quiet mode.
    pub fn report(&mut self, err: &CliError) {
        self.session.fail();
        if self.session.is_quiet() && err.is_controller_failure() {
            debug!(error = %err, "suppressed in quiet mode");
            return;
        }
        if let Err(e) = writeln!(self.err, "{err}") {
            debug!(error = %e, "cannot write to error stream");
        }
    }
}

/// Command handler. Receives the words that passed the arity check,
/// command word included.
pub type Handler = fn(&mut Context<'_>, &[String]) -> Result<(), CliError>;

/// One row of the command table.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    /// Canonical lower-case name.
    pub name: &'static str,
    /// Shortest accepted abbreviation.
    pub min_abbrev: usize,
    /// Fewest words, including the command.
    pub min_args: usize,
    /// Most words, including the command.
    pub max_args: usize,
    /// What to run.
    pub handler: Handler,
}

impl CommandSpec {
    /// Whether `word` selects this command.
    #[must_use]
    pub fn matches(&self, word: &str) -> bool {
        word.len() >= self.min_abbrev
            && word.len() <= self.name.len()
            && self.name.as_bytes()[..word.len()].eq_ignore_ascii_case(word.as_bytes())
    }

    /// Whether the full name must be typed.
    #[must_use]
    pub const fn requires_full_name(&self) -> bool {
        self.min_abbrev == self.name.len()
    }
}

const fn command(
    name: &'static str,
    min_abbrev: usize,
    min_args: usize,
    max_args: usize,
    handler: Handler,
) -> CommandSpec {
    CommandSpec {
        name,
        min_abbrev,
        min_args,
        max_args,
        handler,
    }
}

/// The interpreter's commands.
pub static COMMANDS: &[CommandSpec] = &[
    command("abort", 5, 1, 1, commands::abort),
    command("all", 3, 1, 1, commands::all),
    command("checkpoint", 10, 3, 3, commands::checkpoint),
    command("completing", 3, 1, 1, commands::completing),
    command("delete", 3, 2, usize::MAX, commands::delete),
    command("exit", 1, 1, 1, commands::exit),
    command("help", 2, 1, 1, commands::help),
    command("hide", 2, 1, 1, commands::hide),
    command("oneliner", 1, 1, 1, commands::oneliner),
    command("pidinfo", 3, 2, 2, commands::pidinfo),
    command("ping", 3, 1, 1, commands::ping),
    command("quiet", 4, 1, 1, commands::quiet),
    command("quit", 4, 1, 1, commands::exit),
    command("reconfigure", 3, 1, 1, commands::reconfigure),
    command("requeue", 3, 2, 2, commands::requeue),
    command("resume", 3, 2, 2, commands::resume),
    command("show", 3, 2, 3, commands::show),
    command("shutdown", 8, 1, 1, commands::shutdown),
    command("suspend", 3, 2, 2, commands::suspend),
    command("update", 1, 2, usize::MAX, commands::update),
    command("verbose", 4, 1, 1, commands::verbose),
    command("version", 4, 1, 1, commands::version),
];

/// What the interpreter loop should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitSignal {
    /// Read the next command.
    Continue,
    /// Stop.
    Exit,
}

/// First command in `table` selected by `word`.
#[must_use]
pub fn lookup<'t>(table: &'t [CommandSpec], word: &str) -> Option<&'t CommandSpec> {
    table.iter().find(|spec| spec.matches(word))
}

/// Run one tokenized command against the built-in table.
pub fn dispatch(words: &[String], ctx: &mut Context<'_>) -> ExitSignal {
    dispatch_with(COMMANDS, words, ctx)
}

/// Run one tokenized command against `table`.
pub fn dispatch_with(table: &[CommandSpec], words: &[String], ctx: &mut Context<'_>) -> ExitSignal {
    let Some(keyword) = words.first() else {
        if ctx.session.is_verbose() {
            if let Err(e) = writeln!(ctx.err, "no input") {
                debug!(error = %e, "cannot write to error stream");
            }
        }
        return ExitSignal::Continue;
    };

    let Some(spec) = lookup(table, keyword) else {
        ctx.report(&CliError::InvalidKeyword(keyword.clone()));
        return ExitSignal::Continue;
    };

    if words.len() < spec.min_args {
        ctx.report(&CliError::TooFewArguments(keyword.clone()));
        return ExitSignal::Continue;
    }
    let words = if words.len() > spec.max_args {
        ctx.report(&CliError::TooManyArguments(keyword.clone()));
        &words[..spec.max_args]
    } else {
        words
    };

    debug!(command = spec.name, words = words.len(), "dispatching");
    if let Err(e) = (spec.handler)(ctx, words) {
        ctx.report(&e);
    }

    if ctx.session.exit_requested() {
        ExitSignal::Exit
    } else {
        ExitSignal::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FakeController;
    use crate::session::Verbosity;
    use std::cell::Cell;
    use test_case::test_case;

    fn words(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    /// Run `line` and return (signal, session, stdout, stderr).
    fn run(line: &str, session: Session) -> (ExitSignal, Session, String, String) {
        let mut session = session;
        let mut controller = FakeController::new();
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let signal = {
            let mut ctx = Context {
                session: &mut session,
                controller: &mut controller,
                out: &mut out,
                err: &mut err,
            };
            dispatch(&words(line), &mut ctx)
        };
        (
            signal,
            session,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    thread_local! {
        static SEEN: Cell<usize> = const { Cell::new(0) };
    }

    fn count_words(_ctx: &mut Context<'_>, words: &[String]) -> Result<(), CliError> {
        SEEN.with(|seen| seen.set(words.len()));
        Ok(())
    }

    const PROBE: &[CommandSpec] = &[command("probe", 2, 2, 3, count_words)];

    fn run_probe(line: &str) -> (usize, Session, String) {
        SEEN.with(|seen| seen.set(0));
        let mut session = Session::new();
        let mut controller = FakeController::new();
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let mut ctx = Context {
            session: &mut session,
            controller: &mut controller,
            out: &mut out,
            err: &mut err,
        };
        dispatch_with(PROBE, &words(line), &mut ctx);
        (
            SEEN.with(Cell::get),
            session,
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn every_accepted_prefix_selects_its_own_command() {
        for spec in COMMANDS {
            for len in spec.min_abbrev..=spec.name.len() {
                let prefix = &spec.name[..len];
                let found = lookup(COMMANDS, prefix).map(|s| s.name);
                assert_eq!(found, Some(spec.name), "prefix {prefix:?}");
                let upper = prefix.to_uppercase();
                assert_eq!(lookup(COMMANDS, &upper).map(|s| s.name), Some(spec.name));
            }
        }
    }

    #[test]
    fn table_names_are_lower_case_and_unique() {
        for (i, spec) in COMMANDS.iter().enumerate() {
            assert_eq!(spec.name, spec.name.to_lowercase());
            assert!(spec.min_abbrev >= 1 && spec.min_abbrev <= spec.name.len());
            assert!(spec.min_args >= 1 && spec.min_args <= spec.max_args);
            assert!(COMMANDS[i + 1..].iter().all(|other| other.name != spec.name));
        }
    }

    #[test_case("chec", None ; "checkpoint needs full name")]
    #[test_case("checkpoint", Some("checkpoint") ; "checkpoint full")]
    #[test_case("comp", Some("completing") ; "completing abbreviated")]
    #[test_case("co", None ; "completing too short")]
    #[test_case("quie", Some("quiet") ; "quiet")]
    #[test_case("quit", Some("quit") ; "quit")]
    #[test_case("qui", None ; "quiet or quit")]
    #[test_case("h", None ; "help or hide")]
    #[test_case("e", Some("exit") ; "exit one letter")]
    #[test_case("U", Some("update") ; "update upper case")]
    #[test_case("abor", None ; "abort needs full name")]
    #[test_case("shutdow", None ; "shutdown needs full name")]
    #[test_case("pin", Some("ping") ; "ping")]
    #[test_case("pid", Some("pidinfo") ; "pidinfo")]
    #[test_case("vers", Some("version") ; "version")]
    #[test_case("verb", Some("verbose") ; "verbose")]
    #[test_case("exits", None ; "longer than name")]
    fn lookup_cases(word: &str, expected: Option<&str>) {
        assert_eq!(lookup(COMMANDS, word).map(|s| s.name), expected);
    }

    #[test]
    fn full_name_commands() {
        let full: Vec<&str> = COMMANDS
            .iter()
            .filter(|s| s.requires_full_name())
            .map(|s| s.name)
            .collect();
        assert_eq!(full, ["abort", "all", "checkpoint", "quit", "shutdown"]);
    }

    #[test]
    fn empty_input_is_quiet_and_harmless() {
        let (signal, session, _, err) = run("", Session::new());
        assert_eq!(signal, ExitSignal::Continue);
        assert!(!session.failed());
        assert!(err.is_empty());
    }

    #[test]
    fn empty_input_reported_when_verbose() {
        let mut session = Session::new();
        session.verbosity = Verbosity::Verbose;
        let (_, session, _, err) = run("", session);
        assert_eq!(err, "no input\n");
        assert!(!session.failed());
    }

    #[test]
    fn unknown_keyword_sets_sticky_flag() {
        let (signal, session, _, err) = run("frobnicate now", Session::new());
        assert_eq!(signal, ExitSignal::Continue);
        assert!(session.failed());
        assert_eq!(err, "invalid keyword: frobnicate\n");
    }

    #[test]
    fn too_few_words_skips_handler() {
        let (seen, session, err) = run_probe("probe");
        assert_eq!(seen, 0);
        assert!(session.failed());
        assert_eq!(err, "too few arguments for keyword:probe\n");
    }

    #[test]
    fn too_many_words_runs_handler_on_prefix() {
        let (seen, session, err) = run_probe("PRO a b c d");
        assert_eq!(seen, 3);
        assert!(session.failed());
        assert_eq!(err, "too many arguments for keyword:PRO\n");
    }

    #[test]
    fn arity_within_bounds() {
        let (seen, session, err) = run_probe("pr a");
        assert_eq!(seen, 2);
        assert!(!session.failed());
        assert!(err.is_empty());
    }

    #[test]
    fn exit_stops_the_loop() {
        let (signal, session, _, _) = run("exit", Session::new());
        assert_eq!(signal, ExitSignal::Exit);
        assert!(!session.failed());
        let (signal, _, _, _) = run("QUIT", Session::new());
        assert_eq!(signal, ExitSignal::Exit);
    }

    #[test]
    fn exit_with_extra_words_still_exits_but_fails() {
        let (signal, session, _, err) = run("exit now", Session::new());
        assert_eq!(signal, ExitSignal::Exit);
        assert!(session.failed());
        assert!(err.contains("too many arguments"));
    }

    #[test]
    fn failure_survives_later_success() {
        let (_, session, _, _) = run("bogus", Session::new());
        let (_, session, _, _) = run("all", session);
        assert!(session.all);
        assert!(session.failed());
    }

    #[test]
    fn quiet_hides_controller_failures_only() {
        let mut session = Session::new();
        session.verbosity = Verbosity::Quiet;
        let mut controller = FakeController::new().respond(Err(CliError::Connection(
            "refused".into(),
        )));
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let mut ctx = Context {
            session: &mut session,
            controller: &mut controller,
            out: &mut out,
            err: &mut err,
        };
        dispatch(&words("reconfigure"), &mut ctx);
        dispatch(&words("bogus"), &mut ctx);
        assert!(session.failed());
        assert_eq!(String::from_utf8(err).unwrap(), "invalid keyword: bogus\n");
    }
}
