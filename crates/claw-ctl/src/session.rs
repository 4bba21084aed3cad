//! Per-run interpreter state.

/// Message level selected by `quiet` and `verbose`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Suppress controller failure messages.
    Quiet,
    /// Default.
    #[default]
    Normal,
    /// Report successes and extra detail.
    Verbose,
}

/// Flags shared by every command in a run.
///
/// Built once at startup, changed by flag processing and by the session
/// commands (`all`, `hide`, `quiet`, ...), read at exit to pick the status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Include hidden partitions and their jobs in listings.
    pub all: bool,
    /// Message level.
    pub verbosity: Verbosity,
    /// One record per output line.
    pub one_liner: bool,
    failed: bool,
    exit_requested: bool,
}

impl Session {
    /// Fresh session with every flag cleared.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure. Never undone.
    pub fn fail(&mut self) {
        self.failed = true;
    }

    /// Whether any command has failed.
    #[must_use]
    pub const fn failed(&self) -> bool {
        self.failed
    }

    /// Ask the interpreter loop to stop after the current command.
    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    /// Whether `exit`, `quit` or end of input was seen.
    #[must_use]
    pub const fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Verbose mode.
    #[must_use]
    pub fn is_verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }

    /// Quiet mode.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    /// Numeric process status: `1` once anything failed, else `0`.
    #[must_use]
    pub const fn exit_status(&self) -> u8 {
        if self.failed { 1 } else { 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_is_sticky() {
        let mut session = Session::new();
        assert_eq!(session.exit_status(), 0);
        session.fail();
        session.verbosity = Verbosity::Verbose;
        session.all = true;
        assert!(session.failed());
        assert_eq!(session.exit_status(), 1);
    }

    #[test]
    fn verbosity_defaults_to_normal() {
        let session = Session::new();
        assert!(!session.is_quiet());
        assert!(!session.is_verbose());
        assert!(Verbosity::Quiet < Verbosity::Normal);
    }

    #[test]
    fn exit_request() {
        let mut session = Session::new();
        assert!(!session.exit_requested());
        session.request_exit();
        assert!(session.exit_requested());
    }
}
