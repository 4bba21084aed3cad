//! Control protocol messages.
//!
//! Every operator command that needs the controller becomes exactly one
//! [`ControlRequest`]; the controller answers with one [`ControlResponse`].
//!
//! ```text
//! ┌──────────┐    ControlRequest     ┌──────────────┐
//! │  clawctl │──────────────────────►│  controller  │
//! │          │◄──────────────────────│              │
//! └──────────┘    ControlResponse    └──────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use claw_ctl_proto::{ControlRequest, ControlResponse};
//!
//! let request = ControlRequest::Reconfigure;
//! let json = request.to_json().unwrap();
//! assert!(json.contains("reconfigure"));
//!
//! let response = ControlResponse::from_json(r#"{"type":"ack"}"#).unwrap();
//! assert_eq!(response, ControlResponse::Ack);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{
    BlockUpdate, CheckpointOp, ControllerRole, JobId, JobUpdate, NodeUpdate, PartitionUpdate,
    Record, ShowTarget, StepId,
};
use crate::{ErrorCode, ProtoError};

/// Protocol version for controller communication.
pub const CONTROL_PROTOCOL_VERSION: u32 = 1;

/// Messages sent from the client to the controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlRequest {
    /// Handshake to identify as an administrative client.
    Hello {
        /// Client version.
        version: String,
        /// Protocol version.
        protocol_version: u32,
    },

    /// Liveness probe.
    Ping {
        /// Controller instance being probed.
        role: ControllerRole,
        /// Timestamp for latency measurement.
        timestamp: DateTime<Utc>,
    },

    /// Stop the controller.
    Shutdown {
        /// Abort and leave a core file instead of an orderly stop.
        core: bool,
    },

    /// Re-read configuration files.
    Reconfigure,

    /// Checkpoint operation on a job step.
    Checkpoint {
        /// Operation.
        op: CheckpointOp,
        /// Target step.
        step: StepId,
    },

    /// Put a batch job back in the queue.
    Requeue {
        /// Job to requeue.
        job_id: JobId,
    },

    /// Suspend a running job.
    Suspend {
        /// Job to suspend.
        job_id: JobId,
    },

    /// Resume a suspended job.
    Resume {
        /// Job to resume.
        job_id: JobId,
    },

    /// Modify nodes.
    UpdateNode(NodeUpdate),

    /// Modify a partition.
    UpdatePartition(PartitionUpdate),

    /// Modify a job.
    UpdateJob(JobUpdate),

    /// Change the state of a compute block.
    UpdateBlock(BlockUpdate),

    /// Remove a partition and kill its jobs.
    DeletePartition {
        /// Partition name.
        name: String,
    },

    /// List entities.
    Show {
        /// Entity kind.
        target: ShowTarget,
        /// Single entity id or name; `None` lists all.
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// Include hidden entities.
        include_hidden: bool,
    },

    /// List jobs in completing state with their completing or down nodes.
    ListCompleting,

    /// Find the job owning a process on the local node.
    PidInfo {
        /// Process id.
        pid: u32,
    },
}

/// Responses sent from the controller to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlResponse {
    /// Handshake accepted.
    Welcome {
        /// Controller version.
        server_version: String,
        /// Protocol version.
        protocol_version: u32,
    },

    /// Request applied.
    Ack,

    /// Pong response.
    Pong {
        /// Original timestamp.
        client_timestamp: DateTime<Utc>,
        /// Controller timestamp.
        server_timestamp: DateTime<Utc>,
    },

    /// Entity listing.
    Records {
        /// Matching entities, possibly empty.
        records: Vec<Record>,
    },

    /// Result of a checkpoint `able`/`error` query.
    CheckpointStatus {
        /// Free-form status line.
        status: String,
    },

    /// Job owning a process.
    JobForPid {
        /// Owning job.
        job_id: JobId,
        /// Seconds until the job's time limit, if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        remaining_secs: Option<u64>,
    },

    /// Request failed.
    Error {
        /// Error code.
        code: ErrorCode,
        /// Additional detail.
        message: String,
    },
}

impl ControlRequest {
    /// Create a hello message.
    #[must_use]
    pub fn hello(version: impl Into<String>) -> Self {
        Self::Hello {
            version: version.into(),
            protocol_version: CONTROL_PROTOCOL_VERSION,
        }
    }

    /// Create a ping message for the given controller.
    #[must_use]
    pub fn ping(role: ControllerRole) -> Self {
        Self::Ping {
            role,
            timestamp: Utc::now(),
        }
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, ProtoError> {
        serde_json::to_string(self).map_err(|e| ProtoError::Encoding(e.to_string()))
    }

    /// Deserialize from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> Result<Self, ProtoError> {
        serde_json::from_str(json).map_err(|e| ProtoError::Decoding(e.to_string()))
    }

    /// Get the request type name for error reporting.
    #[must_use]
    pub fn request_type(&self) -> &'static str {
        match self {
            Self::Hello { .. } => "hello",
            Self::Ping { .. } => "ping",
            Self::Shutdown { .. } => "shutdown",
            Self::Reconfigure => "reconfigure",
            Self::Checkpoint { .. } => "checkpoint",
            Self::Requeue { .. } => "requeue",
            Self::Suspend { .. } => "suspend",
            Self::Resume { .. } => "resume",
            Self::UpdateNode(_) => "update_node",
            Self::UpdatePartition(_) => "update_partition",
            Self::UpdateJob(_) => "update_job",
            Self::UpdateBlock(_) => "update_block",
            Self::DeletePartition { .. } => "delete_partition",
            Self::Show { .. } => "show",
            Self::ListCompleting => "list_completing",
            Self::PidInfo { .. } => "pid_info",
        }
    }
}

impl ControlResponse {
    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, ProtoError> {
        serde_json::to_string(self).map_err(|e| ProtoError::Encoding(e.to_string()))
    }

    /// Deserialize from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> Result<Self, ProtoError> {
        serde_json::from_str(json).map_err(|e| ProtoError::Decoding(e.to_string()))
    }
}
