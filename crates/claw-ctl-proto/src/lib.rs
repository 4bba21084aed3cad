//! # claw-ctl-proto
//!
//! Protocol definitions shared between `clawctl` and the cluster controller.
//!
//! The administrative client turns operator input into one of the
//! [`ControlRequest`] variants defined here and expects a [`ControlResponse`]
//! back. Entity updates ([`NodeUpdate`], [`PartitionUpdate`], [`JobUpdate`],
//! [`BlockUpdate`]) are built completely on the client before they are sent.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod codes;
pub mod entity;
pub mod error;
pub mod messages;

pub use codes::ErrorCode;
pub use entity::{
    BlockState, BlockUpdate, CheckpointOp, ControllerRole, JobId, JobUpdate, NodeState,
    NodeUpdate, PartitionState, PartitionUpdate, Record, SharedMode, ShowTarget, StepId,
    INFINITE,
};
pub use error::ProtoError;
pub use messages::{ControlRequest, ControlResponse, CONTROL_PROTOCOL_VERSION};
