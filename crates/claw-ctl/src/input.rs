//! Where operator lines come from.
//!
//! Interactive sessions read through `rustyline`. Piped input is read with
//! [`ReaderLines`], without a prompt; tests use [`ScriptedLines`].

use std::collections::VecDeque;
use std::io::BufRead;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;

use crate::error::CliError;

/// Prompt shown in interactive mode.
pub const PROMPT: &str = "clawctl: ";

/// A source of raw input lines.
pub trait LineSource {
    /// Read the next line. `Ok(None)` means end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying terminal or stream fails.
    fn read_line(&mut self) -> Result<Option<String>, CliError>;

    /// Record an accepted line in the source's history, if it keeps one.
    fn add_history(&mut self, _line: &str) {}
}

/// Line-editing terminal input.
pub struct EditorLines {
    editor: DefaultEditor,
}

impl std::fmt::Debug for EditorLines {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorLines").finish_non_exhaustive()
    }
}

impl EditorLines {
    /// Create a line editor with in-memory history.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be initialised.
    pub fn new() -> Result<Self, CliError> {
        let editor = DefaultEditor::new().map_err(|e| CliError::Readline(e.to_string()))?;
        Ok(Self { editor })
    }
}

impl LineSource for EditorLines {
    fn read_line(&mut self) -> Result<Option<String>, CliError> {
        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => return Ok(Some(line)),
                Err(ReadlineError::Eof) => return Ok(None),
                // Ctrl-C drops the partial line.
                Err(ReadlineError::Interrupted) => {}
                Err(e) => return Err(CliError::Readline(e.to_string())),
            }
        }
    }

    fn add_history(&mut self, line: &str) {
        if let Err(e) = self.editor.add_history_entry(line) {
            debug!(error = %e, "failed to record history");
        }
    }
}

/// Lines from any buffered reader, e.g. a piped standard input.
#[derive(Debug)]
pub struct ReaderLines<R> {
    reader: R,
}

impl<R: BufRead> ReaderLines<R> {
    /// Read lines from `reader`.
    pub const fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for ReaderLines<R> {
    fn read_line(&mut self) -> Result<Option<String>, CliError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }
}

/// A fixed list of lines, consumed in order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLines {
    lines: VecDeque<String>,
    history: Vec<String>,
}

impl ScriptedLines {
    /// Create a source that yields `lines` then end of input.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            history: Vec::new(),
        }
    }

    /// Lines recorded through [`LineSource::add_history`].
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }
}

impl LineSource for ScriptedLines {
    fn read_line(&mut self) -> Result<Option<String>, CliError> {
        Ok(self.lines.pop_front())
    }

    fn add_history(&mut self, line: &str) {
        self.history.push(line.to_owned());
    }
}
