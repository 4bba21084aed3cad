//! The read-tokenize-dispatch loop.

use std::io::Write;

use tracing::{debug, info};

use crate::client::Controller;
use crate::dispatch::{dispatch, Context, ExitSignal};
use crate::error::CliError;
use crate::input::LineSource;
use crate::session::Session;
use crate::tokenizer::Tokenizer;

/// Owns the session for one run of the tool.
pub struct Interpreter<'a> {
    session: Session,
    controller: &'a mut dyn Controller,
}

impl std::fmt::Debug for Interpreter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl<'a> Interpreter<'a> {
    /// Create an interpreter with the given starting flags.
    pub fn new(session: Session, controller: &'a mut dyn Controller) -> Self {
        Self {
            session,
            controller,
        }
    }

    /// Current session flags.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Consume the interpreter, returning the final session.
    #[must_use]
    pub fn into_session(self) -> Session {
        self.session
    }

    /// Run a single command given as process arguments, then stop.
    ///
    /// The words are used as given; the word limit grows to fit them.
    pub fn run_once(&mut self, words: &[String], out: &mut dyn Write, err: &mut dyn Write) {
        debug!(words = words.len(), "running command from arguments");
        let mut ctx = Context {
            session: &mut self.session,
            controller: &mut *self.controller,
            out,
            err,
        };
        dispatch(words, &mut ctx);
    }

    /// Read and run commands until `exit`, `quit` or end of input.
    ///
    /// An over-long line is reported and skipped. A failing line source
    /// ends the loop.
    pub fn run_interactive(
        &mut self,
        source: &mut dyn LineSource,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) {
        let mut tokenizer = Tokenizer::new();
        let mut ctx = Context {
            session: &mut self.session,
            controller: &mut *self.controller,
            out,
            err,
        };
        loop {
            let words = match tokenizer.next_command(source) {
                Ok(Some(words)) => words,
                Ok(None) => {
                    info!("end of input");
                    break;
                }
                Err(e @ CliError::TooManyWords { .. }) => {
                    ctx.report(&e);
                    continue;
                }
                Err(e) => {
                    ctx.report(&e);
                    break;
                }
            };
            if dispatch(&words, &mut ctx) == ExitSignal::Exit {
                break;
            }
            if let Err(e) = ctx.out.flush() {
                debug!(error = %e, "flush failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FakeController;
    use crate::input::ScriptedLines;
    use crate::tokenizer::MAX_INPUT_FIELDS;
    use claw_ctl_proto::{ControlRequest, JobId};

    fn interactive(lines: &[&str], controller: &mut FakeController) -> (Session, String, String) {
        let mut source = ScriptedLines::new(lines.iter().copied());
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let mut interpreter = Interpreter::new(Session::new(), controller);
        interpreter.run_interactive(&mut source, &mut out, &mut err);
        (
            interpreter.into_session(),
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn end_of_input_is_exit() {
        let mut controller = FakeController::new();
        let (session, _, _) = interactive(&["all"], &mut controller);
        assert!(session.all);
        assert!(!session.failed());
    }

    #[test]
    fn exit_stops_reading() {
        let mut controller = FakeController::new();
        interactive(&["quit", "reconfigure"], &mut controller);
        assert!(controller.requests.is_empty());
    }

    #[test]
    fn repeat_replays_previous_command() {
        let mut controller = FakeController::new();
        let (session, _, _) = interactive(&["requeue 5", "!!", "!!"], &mut controller);
        let expected = ControlRequest::Requeue {
            job_id: JobId::new(5),
        };
        assert_eq!(controller.requests, vec![expected.clone(), expected.clone(), expected]);
        assert!(!session.failed());
    }

    #[test]
    fn errors_do_not_stop_the_loop() {
        let mut controller = FakeController::new();
        let (session, _, err) =
            interactive(&["bogus", "update State=DOWN", "reconfigure"], &mut controller);
        assert!(session.failed());
        assert_eq!(controller.requests, vec![ControlRequest::Reconfigure]);
        assert!(err.starts_with("invalid keyword: bogus\n"));
    }

    #[test]
    fn overflow_is_reported_and_skipped() {
        let mut controller = FakeController::new();
        let long = vec!["x"; MAX_INPUT_FIELDS + 1].join(" ");
        let (session, _, err) = interactive(&[long.as_str(), "reconfigure"], &mut controller);
        assert!(session.failed());
        assert_eq!(err, format!("can not process over {MAX_INPUT_FIELDS} words\n"));
        assert_eq!(controller.requests, vec![ControlRequest::Reconfigure]);
    }

    #[test]
    fn blank_lines_are_ignored() {
        let mut controller = FakeController::new();
        let (session, out, err) = interactive(&["", "   "], &mut controller);
        assert!(!session.failed());
        assert!(out.is_empty() && err.is_empty());
    }

    #[test]
    fn run_once_has_no_word_limit() {
        let mut controller = FakeController::new();
        let words: Vec<String> = std::iter::once("hide".to_string())
            .chain((0..MAX_INPUT_FIELDS).map(|i| format!("w{i}")))
            .collect();
        let mut interpreter = Interpreter::new(Session::new(), &mut controller);
        let (mut out, mut err) = (Vec::new(), Vec::new());
        interpreter.run_once(&words, &mut out, &mut err);
        assert!(interpreter.session().failed());
        assert_eq!(
            String::from_utf8(err).unwrap(),
            "too many arguments for keyword:hide\n"
        );
    }

    #[test]
    fn run_once_does_not_retokenize() {
        let mut controller = FakeController::new();
        let words = vec![
            "update".to_string(),
            "NodeName=lx01".to_string(),
            "State=DRAIN".to_string(),
            "Reason=disk swap".to_string(),
        ];
        let mut interpreter = Interpreter::new(Session::new(), &mut controller);
        interpreter.run_once(&words, &mut Vec::new(), &mut Vec::new());
        assert!(!interpreter.session().failed());
        match controller.requests.as_slice() {
            [ControlRequest::UpdateNode(update)] => {
                assert_eq!(update.reason.as_deref(), Some("disk swap"));
            }
            other => panic!("unexpected requests: {other:?}"),
        }
    }
}
