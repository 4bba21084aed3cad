//! Numeric error codes returned by the controller.
//!
//! The controller reports failures as a bare code plus optional text. The
//! client turns the code into an operator-facing description; unknown codes
//! still render, with their number.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error codes understood by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum ErrorCode {
    /// Unclassified controller failure.
    Unspecified,
    /// Caller lacks the privileges for this operation.
    AccessDenied,
    /// No node matches the given name.
    InvalidNodeName,
    /// No partition matches the given name.
    InvalidPartitionName,
    /// No job matches the given id.
    InvalidJobId,
    /// The requested state transition is not allowed.
    InvalidStateTransition,
    /// The job already finished.
    AlreadyDone,
    /// The job is not suspended (resume) or not running (suspend).
    JobNotSuspendable,
    /// Checkpointing is not enabled on this cluster.
    CheckpointDisabled,
    /// Compute blocks are not supported by this controller.
    BlocksNotSupported,
    /// The controller is shutting down or in standby.
    InStandby,
    /// No local job owns the given process.
    NoJobForPid,
    /// A code this client does not know.
    Other(u32),
}

impl ErrorCode {
    /// Human-readable description of the code.
    #[must_use]
    pub fn describe(self) -> String {
        let text = match self {
            Self::Unspecified => "Unspecified error",
            Self::AccessDenied => "Access/permission denied",
            Self::InvalidNodeName => "Invalid node name specified",
            Self::InvalidPartitionName => "Invalid partition name specified",
            Self::InvalidJobId => "Invalid job id specified",
            Self::InvalidStateTransition => "Requested state transition is not allowed",
            Self::AlreadyDone => "Job/step already completed",
            Self::JobNotSuspendable => "Job is not in a state that permits this operation",
            Self::CheckpointDisabled => "Checkpoint operations are disabled",
            Self::BlocksNotSupported => "Block operations are not supported by this controller",
            Self::InStandby => "Controller is in standby mode",
            Self::NoJobForPid => "No job found for the given process id",
            Self::Other(code) => return format!("Unknown error code {code}"),
        };
        text.to_string()
    }

    /// Numeric wire value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        match self {
            Self::Unspecified => 1,
            Self::AccessDenied => 2,
            Self::InvalidNodeName => 2001,
            Self::InvalidPartitionName => 2002,
            Self::InvalidJobId => 2003,
            Self::InvalidStateTransition => 2004,
            Self::AlreadyDone => 2005,
            Self::JobNotSuspendable => 2006,
            Self::CheckpointDisabled => 2007,
            Self::BlocksNotSupported => 2008,
            Self::InStandby => 2009,
            Self::NoJobForPid => 2010,
            Self::Other(code) => code,
        }
    }
}

impl From<u32> for ErrorCode {
    fn from(code: u32) -> Self {
        match code {
            1 => Self::Unspecified,
            2 => Self::AccessDenied,
            2001 => Self::InvalidNodeName,
            2002 => Self::InvalidPartitionName,
            2003 => Self::InvalidJobId,
            2004 => Self::InvalidStateTransition,
            2005 => Self::AlreadyDone,
            2006 => Self::JobNotSuspendable,
            2007 => Self::CheckpointDisabled,
            2008 => Self::BlocksNotSupported,
            2009 => Self::InStandby,
            2010 => Self::NoJobForPid,
            other => Self::Other(other),
        }
    }
}

impl From<ErrorCode> for u32 {
    fn from(code: ErrorCode) -> Self {
        code.as_u32()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_codes_describe() {
        assert_eq!(
            ErrorCode::InvalidJobId.describe(),
            "Invalid job id specified"
        );
        assert_eq!(ErrorCode::from(2).to_string(), "Access/permission denied");
    }

    #[test]
    fn unknown_code_keeps_number() {
        let code = ErrorCode::from(9999);
        assert_eq!(code, ErrorCode::Other(9999));
        assert_eq!(code.describe(), "Unknown error code 9999");
    }

    #[test]
    fn serializes_as_number() {
        let json = serde_json::to_string(&ErrorCode::InvalidNodeName).unwrap();
        assert_eq!(json, "2001");
        let back: ErrorCode = serde_json::from_str("2003").unwrap();
        assert_eq!(back, ErrorCode::InvalidJobId);
    }

    proptest! {
        #[test]
        fn prop_code_value_is_preserved(code in any::<u32>()) {
            prop_assert_eq!(ErrorCode::from(code).as_u32(), code);
        }
    }
}
