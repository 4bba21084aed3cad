//! Keyword/value extraction from specification text.
//!
//! A specification is free-form text of `Keyword=value` fragments, as typed
//! after `update` or `delete`. Callers describe the keywords they understand
//! with a list of [`Field`]s; [`SpecText::extract`] fills each field's
//! destination and overwrites the matched text with spaces. Whatever is left
//! afterwards was not understood, and [`SpecText::residual`] reports it.
//!
//! ```
//! use claw_ctl::spec_parser::{Field, SpecText};
//!
//! let mut spec = SpecText::new("NodeName=lx01 State=DOWN Bogus=1");
//! let (mut name, mut state) = (None, None);
//! spec.extract(&mut [
//!     Field::string("NodeName", &mut name),
//!     Field::string("State", &mut state),
//! ])?;
//! assert_eq!(name.as_deref(), Some("lx01"));
//! assert_eq!(state.as_deref(), Some("DOWN"));
//! assert_eq!(spec.residual(), Some("Bogus=1"));
//! # Ok::<(), claw_ctl::spec_parser::SpecError>(())
//! ```

use std::fmt;

use claw_ctl_proto::INFINITE;
use thiserror::Error;
use tracing::trace;

/// Errors raised while converting a keyword's value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    /// The keyword is present but nothing follows the `=`.
    #[error("missing value for keyword {keyword}")]
    MissingValue {
        /// Keyword as declared by the caller.
        keyword: String,
    },

    /// The value does not parse as the declared type.
    #[error("invalid {kind} value for keyword {keyword}: {value}")]
    InvalidValue {
        /// Keyword as declared by the caller.
        keyword: String,
        /// Declared type.
        kind: FieldType,
        /// Offending text.
        value: String,
    },
}

/// Value type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// 32-bit signed integer.
    Int,
    /// Floating point.
    Float,
    /// Arbitrary text.
    Str,
    /// 64-bit signed integer.
    Long,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Int => "integer",
            Self::Float => "float",
            Self::Str => "string",
            Self::Long => "long",
        })
    }
}

/// Destination of an extracted value.
#[derive(Debug)]
pub enum Slot<'a> {
    /// Integer destination.
    Int(&'a mut Option<i32>),
    /// Long destination.
    Long(&'a mut Option<i64>),
    /// Float destination.
    Float(&'a mut Option<f64>),
    /// String destination; any previous value is replaced.
    Str(&'a mut Option<String>),
}

/// One keyword the caller wants extracted.
#[derive(Debug)]
pub struct Field<'a> {
    keyword: &'static str,
    slot: Slot<'a>,
}

impl<'a> Field<'a> {
    /// An integer field.
    pub fn int(keyword: &'static str, dest: &'a mut Option<i32>) -> Self {
        Self {
            keyword,
            slot: Slot::Int(dest),
        }
    }

    /// A long field.
    pub fn long(keyword: &'static str, dest: &'a mut Option<i64>) -> Self {
        Self {
            keyword,
            slot: Slot::Long(dest),
        }
    }

    /// A float field.
    pub fn float(keyword: &'static str, dest: &'a mut Option<f64>) -> Self {
        Self {
            keyword,
            slot: Slot::Float(dest),
        }
    }

    /// A string field.
    pub fn string(keyword: &'static str, dest: &'a mut Option<String>) -> Self {
        Self {
            keyword,
            slot: Slot::Str(dest),
        }
    }

    /// Declared value type.
    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        match self.slot {
            Slot::Int(_) => FieldType::Int,
            Slot::Long(_) => FieldType::Long,
            Slot::Float(_) => FieldType::Float,
            Slot::Str(_) => FieldType::Str,
        }
    }

    fn store(&mut self, value: String) -> Result<(), SpecError> {
        let keyword = self.keyword;
        match &mut self.slot {
            Slot::Str(dest) => **dest = Some(value),
            Slot::Long(dest) => **dest = Some(parse_integer(keyword, FieldType::Long, &value)?),
            Slot::Int(dest) => {
                let n = parse_integer(keyword, FieldType::Int, &value)?;
                let n = i32::try_from(n).map_err(|_| invalid(keyword, FieldType::Int, &value))?;
                **dest = Some(n);
            }
            Slot::Float(dest) => **dest = Some(parse_float(keyword, &value)?),
        }
        Ok(())
    }
}

/// Mutable specification text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecText {
    buf: String,
}

impl SpecText {
    /// Wrap raw specification text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { buf: text.into() }
    }

    /// Re-join tokenized words into specification text.
    ///
    /// Whitespace, quotes and backslashes inside a word are escaped so each
    /// word's value comes back out intact.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
        let mut buf = String::new();
        for (i, token) in tokens.iter().enumerate() {
            if i > 0 {
                buf.push(' ');
            }
            for c in token.as_ref().chars() {
                if c == '\\' || c == '"' || c.is_whitespace() {
                    buf.push('\\');
                }
                buf.push(c);
            }
        }
        Self { buf }
    }

    /// Current contents, including any blanked regions.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// First fragment left over after extraction, if any.
    #[must_use]
    pub fn residual(&self) -> Option<&str> {
        self.buf.split_whitespace().next()
    }

    /// Whether every fragment has been consumed.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.residual().is_none()
    }

    /// Extract every field present in the text.
    ///
    /// Fields may be listed in any order. A keyword that does not appear
    /// leaves its destination untouched. Matched `Keyword=value` text is
    /// overwritten with spaces.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::MissingValue`] for `Keyword=` with nothing after
    /// it, and [`SpecError::InvalidValue`] when a value does not parse as the
    /// field's type.
    pub fn extract(&mut self, fields: &mut [Field<'_>]) -> Result<(), SpecError> {
        for field in fields.iter_mut() {
            let Some(start) = self.find_keyword(field.keyword) else {
                continue;
            };
            let value_start = start + field.keyword.len() + 1;
            let (value, end) = scan_value(&self.buf, value_start);
            if end == value_start {
                return Err(SpecError::MissingValue {
                    keyword: field.keyword.to_string(),
                });
            }
            if value.is_empty() && field.field_type() != FieldType::Str {
                return Err(SpecError::MissingValue {
                    keyword: field.keyword.to_string(),
                });
            }
            trace!(keyword = field.keyword, value = %value, "extracted field");
            field.store(value)?;
            self.buf.replace_range(start..end, &" ".repeat(end - start));
        }
        Ok(())
    }

    /// Byte offset of `keyword=` at the start of a fragment, ignoring case.
    fn find_keyword(&self, keyword: &str) -> Option<usize> {
        let hay = self.buf.to_ascii_lowercase();
        let needle = format!("{}=", keyword.to_ascii_lowercase());
        fragment_starts(&self.buf)
            .into_iter()
            .find(|&pos| hay[pos..].starts_with(&needle))
    }
}

impl fmt::Display for SpecText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.buf)
    }
}

/// Extract `fields` from `spec`. See [`SpecText::extract`].
///
/// # Errors
///
/// Propagates the first conversion failure.
pub fn extract(spec: &mut SpecText, fields: &mut [Field<'_>]) -> Result<(), SpecError> {
    spec.extract(fields)
}

/// Read a value starting at `start` up to the next unescaped, unquoted
/// whitespace. Returns the decoded value and the end offset of the raw text.
/// Offsets where a fragment begins: the start of the text, or the first
/// character after whitespace that is neither escaped nor quoted.
fn fragment_starts(buf: &str) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut after_space = true;
    let mut quoted = false;
    let mut escaped = false;
    for (i, c) in buf.char_indices() {
        if !escaped && !quoted && c.is_whitespace() {
            after_space = true;
            continue;
        }
        if after_space {
            starts.push(i);
            after_space = false;
        }
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            quoted = !quoted;
        }
    }
    starts
}

fn scan_value(buf: &str, start: usize) -> (String, usize) {
    let mut value = String::new();
    let mut quoted = false;
    let mut escaped = false;
    for (i, c) in buf[start..].char_indices() {
        if escaped {
            value.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => quoted = !quoted,
            c if c.is_whitespace() && !quoted => return (value, start + i),
            c => value.push(c),
        }
    }
    (value, buf.len())
}

fn invalid(keyword: &str, kind: FieldType, value: &str) -> SpecError {
    SpecError::InvalidValue {
        keyword: keyword.to_string(),
        kind,
        value: value.to_string(),
    }
}

/// Signed decimal with an optional alphabetic unit suffix, or `UNLIMITED`.
fn parse_integer(keyword: &str, kind: FieldType, value: &str) -> Result<i64, SpecError> {
    if value.eq_ignore_ascii_case("UNLIMITED") || value.eq_ignore_ascii_case("INFINITE") {
        return Ok(i64::from(INFINITE));
    }
    let number_end = value
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map_or(value.len(), |(i, _)| i);
    let (number, unit) = value.split_at(number_end);
    if !unit.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(invalid(keyword, kind, value));
    }
    number.parse::<i64>().map_err(|_| invalid(keyword, kind, value))
}

/// Decimal or scientific literal; `inf` and `nan` are refused.
fn parse_float(keyword: &str, value: &str) -> Result<f64, SpecError> {
    let leads_numeric = value
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'));
    match value.parse::<f64>() {
        Ok(n) if leads_numeric && n.is_finite() => Ok(n),
        _ => Err(invalid(keyword, FieldType::Float, value)),
    }
}
