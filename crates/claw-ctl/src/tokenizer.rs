//! Quote-aware line tokenizer with `!!` replay.
//!
//! Words are separated by whitespace outside quotes. A `"` or `'` opens a
//! quoted run that lasts until the matching quote of the same kind; the
//! other quote kind is literal inside it. Quote delimiters are dropped, so
//! `State="DOWN now"` becomes the single word `State=DOWN now`.
//!
//! Every accepted line is kept as an owned snapshot for replay. Splitting
//! never touches the snapshot, so `!!` always sees the text as typed.

use tracing::trace;

use crate::error::CliError;
use crate::input::LineSource;

/// Default limit on the number of words in one input line.
pub const MAX_INPUT_FIELDS: usize = 128;

/// Input that replays the previous line.
pub const REPEAT_LAST: &str = "!!";

/// Splits operator input into words and remembers the last line.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    limit: usize,
    last_line: Option<String>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    /// Create a tokenizer with the default word limit.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_limit(MAX_INPUT_FIELDS)
    }

    /// Create a tokenizer accepting at most `limit` words per line.
    #[must_use]
    pub const fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            last_line: None,
        }
    }

    /// The most recent line that was not itself `!!`.
    #[must_use]
    pub fn last_line(&self) -> Option<&str> {
        self.last_line.as_deref()
    }

    /// Read one line from `source` and tokenize it.
    ///
    /// Returns `Ok(None)` at end of input, which the interpreter treats as
    /// an implicit `exit`.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::TooManyWords`] if the line exceeds the limit, or
    /// any error the line source reports.
    pub fn next_command(
        &mut self,
        source: &mut dyn LineSource,
    ) -> Result<Option<Vec<String>>, CliError> {
        let Some(line) = source.read_line()? else {
            return Ok(None);
        };
        let text = self.accept(&line);
        if !text.trim().is_empty() {
            source.add_history(&text);
        }
        split_words(&text, self.limit).map(Some)
    }

    /// Tokenize a line that was handed over directly.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::TooManyWords`] if the line exceeds the limit.
    pub fn tokenize(&mut self, line: &str) -> Result<Vec<String>, CliError> {
        let text = self.accept(line);
        split_words(&text, self.limit)
    }

    /// Resolve `!!` and snapshot the line for later replay.
    fn accept(&mut self, line: &str) -> String {
        if line.trim() == REPEAT_LAST {
            trace!(replay = ?self.last_line, "repeating last command");
            return self.last_line.clone().unwrap_or_default();
        }
        self.last_line = Some(line.to_owned());
        line.to_owned()
    }
}

/// Split `text` into words, honouring quotes.
///
/// # Errors
///
/// Returns [`CliError::TooManyWords`] once more than `limit` words are found.
pub fn split_words(text: &str, limit: usize) -> Result<Vec<String>, CliError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in text.chars() {
        match quote {
            Some(open) if c == open => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c.is_whitespace() => push_word(&mut words, &mut current, limit)?,
            None => current.push(c),
        }
    }
    // An unterminated quote runs to the end of the line.
    push_word(&mut words, &mut current, limit)?;

    trace!(count = words.len(), "tokenized line");
    Ok(words)
}

fn push_word(words: &mut Vec<String>, current: &mut String, limit: usize) -> Result<(), CliError> {
    if current.is_empty() {
        return Ok(());
    }
    if words.len() >= limit {
        return Err(CliError::TooManyWords { limit });
    }
    words.push(std::mem::take(current));
    Ok(())
}
