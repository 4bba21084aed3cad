//! Output formatting for interpreter commands.
//!
//! Controller listings are printed as `Key=Value` records, either wrapped
//! across lines with a blank line between records or one record per line.

use std::io::Write;

use claw_ctl_proto::{JobId, Record};

use crate::error::CliError;

/// Width at which multi-line records wrap.
const LINE_WIDTH: usize = 78;

/// Indent for wrapped continuation lines.
const CONTINUATION: &str = "   ";

/// Record layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Layout {
    /// Wrapped, blank line after each record.
    #[default]
    MultiLine,
    /// One record per line.
    OneLine,
}

impl Layout {
    /// Layout for the session's `oneliner` flag.
    #[must_use]
    pub const fn from_one_liner(one_liner: bool) -> Self {
        if one_liner { Self::OneLine } else { Self::MultiLine }
    }
}

/// Types that render as operator output.
pub trait Report {
    /// Write the value in the given layout.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_report<W: Write>(&self, writer: &mut W, layout: Layout) -> Result<(), CliError>;

    /// Render to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn to_report_string(&self, layout: Layout) -> Result<String, CliError> {
        let mut buf = Vec::new();
        self.write_report(&mut buf, layout)?;
        String::from_utf8(buf).map_err(|e| CliError::Protocol(format!("UTF-8 error: {e}")))
    }
}

impl Report for Record {
    fn write_report<W: Write>(&self, writer: &mut W, layout: Layout) -> Result<(), CliError> {
        let pairs = self.fields().iter().map(|(k, v)| format!("{k}={v}"));
        match layout {
            Layout::OneLine => {
                let line: Vec<String> = pairs.collect();
                writeln!(writer, "{}", line.join(" "))?;
            }
            Layout::MultiLine => {
                let mut line = String::new();
                for pair in pairs {
                    if !line.trim().is_empty() && line.len() + 1 + pair.len() > LINE_WIDTH {
                        writeln!(writer, "{line}")?;
                        line = CONTINUATION.to_string();
                    } else if !line.is_empty() {
                        line.push(' ');
                    }
                    line.push_str(&pair);
                }
                if !line.trim().is_empty() {
                    writeln!(writer, "{line}")?;
                }
                writeln!(writer)?;
            }
        }
        Ok(())
    }
}

/// A controller listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordList<'a> {
    /// What was listed, for the empty-listing message.
    pub what: &'a str,
    /// Records in controller order.
    pub records: &'a [Record],
}

impl Report for RecordList<'_> {
    fn write_report<W: Write>(&self, writer: &mut W, layout: Layout) -> Result<(), CliError> {
        if self.records.is_empty() {
            writeln!(writer, "No {} in the system", self.what)?;
            return Ok(());
        }
        for record in self.records {
            record.write_report(writer, layout)?;
        }
        Ok(())
    }
}

/// Liveness of both controllers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingReport {
    /// Primary controller address.
    pub primary: String,
    /// Backup controller address, if configured.
    pub backup: Option<String>,
    /// Primary answered.
    pub primary_up: bool,
    /// Backup answered.
    pub backup_up: bool,
}

impl Report for PingReport {
    fn write_report<W: Write>(&self, writer: &mut W, _layout: Layout) -> Result<(), CliError> {
        writeln!(
            writer,
            "Controller(primary/backup) at {}/{} are {}/{}",
            self.primary,
            self.backup.as_deref().unwrap_or("(none)"),
            up_down(self.primary_up),
            up_down(self.backup_up),
        )?;
        Ok(())
    }
}

const fn up_down(up: bool) -> &'static str {
    if up { "UP" } else { "DOWN" }
}

/// Job owning a local process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PidReport {
    /// Process id that was asked about.
    pub pid: u32,
    /// Owning job.
    pub job_id: JobId,
    /// Seconds left before the job's time limit.
    pub remaining_secs: Option<u64>,
}

impl Report for PidReport {
    fn write_report<W: Write>(&self, writer: &mut W, _layout: Layout) -> Result<(), CliError> {
        write!(writer, "Pid {} is in JobId={}", self.pid, self.job_id)?;
        match self.remaining_secs {
            Some(secs) => writeln!(writer, ", time left {}", format_duration(secs))?,
            None => writeln!(writer, ", no time limit")?,
        }
        Ok(())
    }
}

/// `[days-]hours:minutes:seconds`.
fn format_duration(secs: u64) -> String {
    let (days, rem) = (secs / 86_400, secs % 86_400);
    let (hours, rem) = (rem / 3600, rem % 3600);
    let (minutes, seconds) = (rem / 60, rem % 60);
    if days > 0 {
        format!("{days}-{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    }
}

/// Plain message line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message text.
    pub message: String,
}

impl Message {
    /// Create a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Report for Message {
    fn write_report<W: Write>(&self, writer: &mut W, _layout: Layout) -> Result<(), CliError> {
        writeln!(writer, "{}", self.message)?;
        Ok(())
    }
}
