//! Cluster entity types carried by controller requests.
//!
//! Enumerated values (node states, partition flags, checkpoint operations)
//! are parsed case-insensitively from the operator's spelling and rendered
//! back in upper case, matching the configuration file syntax.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtoError;

/// Sentinel used for numeric limits that are "unlimited".
pub const INFINITE: i32 = -1;

/// Look up `input` in a keyword table, ignoring ASCII case.
fn parse_keyword<T: Copy>(input: &str, table: &[(&str, T)], what: &str) -> Result<T, ProtoError> {
    table
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(input))
        .map(|(_, value)| *value)
        .ok_or_else(|| {
            let accepted: Vec<&str> = table.iter().map(|(name, _)| *name).collect();
            ProtoError::Validation(format!(
                "invalid {what} '{input}', acceptable values are {}",
                accepted.join(", ")
            ))
        })
}

/// Reverse lookup for display.
fn keyword_of<T: Copy + PartialEq>(value: T, table: &[(&'static str, T)]) -> &'static str {
    table
        .iter()
        .find(|(_, v)| *v == value)
        .map_or("UNKNOWN", |(name, _)| name)
}

// ============================================================================
// Identifiers
// ============================================================================

/// Numeric job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(u32);

impl JobId {
    /// Create a job ID from its numeric value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Parse a job ID from its decimal representation.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a positive decimal number.
    pub fn parse(s: &str) -> Result<Self, ProtoError> {
        match s.trim().parse::<u32>() {
            Ok(0) | Err(_) => Err(ProtoError::Validation(format!("invalid job id: {s}"))),
            Ok(id) => Ok(Self(id)),
        }
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A job step, written `<job>[.<step>]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepId {
    /// Owning job.
    pub job_id: JobId,
    /// Step within the job; `None` addresses the whole job.
    pub step: Option<u32>,
}

impl StepId {
    /// Parse `<job>` or `<job>.<step>`.
    ///
    /// # Errors
    ///
    /// Returns an error if either component is not a number.
    pub fn parse(s: &str) -> Result<Self, ProtoError> {
        let (job, step) = match s.split_once('.') {
            Some((job, step)) => {
                let step = step
                    .parse::<u32>()
                    .map_err(|_| ProtoError::Validation(format!("invalid step id: {s}")))?;
                (job, Some(step))
            }
            None => (s, None),
        };
        Ok(Self {
            job_id: JobId::parse(job)?,
            step,
        })
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.step {
            Some(step) => write!(f, "{}.{step}", self.job_id),
            None => write!(f, "{}", self.job_id),
        }
    }
}

// ============================================================================
// Enumerated values
// ============================================================================

/// Node state an administrator may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    /// Take the node out of service immediately.
    Down,
    /// Let running jobs finish, accept no new ones.
    Drain,
    /// Mark the node as failing; jobs finish, then the node goes down.
    Fail,
    /// Return the node to service as idle.
    Idle,
    /// Undo a previous drain or down.
    Resume,
    /// Flag the node as not responding.
    NoResp,
}

const NODE_STATES: &[(&str, NodeState)] = &[
    ("DOWN", NodeState::Down),
    ("DRAIN", NodeState::Drain),
    ("FAIL", NodeState::Fail),
    ("IDLE", NodeState::Idle),
    ("RESUME", NodeState::Resume),
    ("NORESP", NodeState::NoResp),
];

impl NodeState {
    /// Whether the controller needs a reason recorded with this state.
    #[must_use]
    pub const fn requires_reason(self) -> bool {
        matches!(self, Self::Down | Self::Drain | Self::Fail)
    }
}

impl FromStr for NodeState {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_keyword(s, NODE_STATES, "node state")
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(keyword_of(*self, NODE_STATES))
    }
}

/// Partition availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionState {
    /// Jobs may be scheduled.
    Up,
    /// No new jobs start.
    Down,
}

const PARTITION_STATES: &[(&str, PartitionState)] =
    &[("UP", PartitionState::Up), ("DOWN", PartitionState::Down)];

impl FromStr for PartitionState {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_keyword(s, PARTITION_STATES, "partition state")
    }
}

impl fmt::Display for PartitionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(keyword_of(*self, PARTITION_STATES))
    }
}

/// Node sharing policy of a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharedMode {
    /// Jobs may request shared nodes.
    Yes,
    /// Nodes are never shared.
    No,
    /// Nodes are always shared.
    Force,
    /// Jobs always get whole nodes.
    Exclusive,
}

const SHARED_MODES: &[(&str, SharedMode)] = &[
    ("YES", SharedMode::Yes),
    ("NO", SharedMode::No),
    ("FORCE", SharedMode::Force),
    ("EXCLUSIVE", SharedMode::Exclusive),
];

impl FromStr for SharedMode {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_keyword(s, SHARED_MODES, "shared mode")
    }
}

impl fmt::Display for SharedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(keyword_of(*self, SHARED_MODES))
    }
}

/// State of a compute block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockState {
    /// Block is unusable.
    Error,
    /// Block is available for jobs.
    Free,
}

const BLOCK_STATES: &[(&str, BlockState)] =
    &[("ERROR", BlockState::Error), ("FREE", BlockState::Free)];

impl FromStr for BlockState {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_keyword(s, BLOCK_STATES, "block state")
    }
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(keyword_of(*self, BLOCK_STATES))
    }
}

/// Checkpoint operation on a job step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointOp {
    /// Report whether the step can be checkpointed.
    Able,
    /// Disallow checkpoints.
    Disable,
    /// Allow checkpoints again.
    Enable,
    /// Checkpoint and keep running.
    Create,
    /// Checkpoint and terminate.
    Vacate,
    /// Restart from the last checkpoint.
    Restart,
    /// Report the last checkpoint error.
    Error,
}

const CHECKPOINT_OPS: &[(&str, CheckpointOp)] = &[
    ("able", CheckpointOp::Able),
    ("disable", CheckpointOp::Disable),
    ("enable", CheckpointOp::Enable),
    ("create", CheckpointOp::Create),
    ("vacate", CheckpointOp::Vacate),
    ("restart", CheckpointOp::Restart),
    ("error", CheckpointOp::Error),
];

impl FromStr for CheckpointOp {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_keyword(s, CHECKPOINT_OPS, "checkpoint operation")
    }
}

impl fmt::Display for CheckpointOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(keyword_of(*self, CHECKPOINT_OPS))
    }
}

/// Which controller instance a request is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerRole {
    /// The active controller.
    Primary,
    /// The standby controller.
    Backup,
}

/// Entity kinds that `show` can list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShowTarget {
    /// Controller configuration parameters.
    Config,
    /// Jobs.
    Jobs,
    /// Nodes.
    Nodes,
    /// Partitions.
    Partitions,
    /// Job steps.
    Steps,
    /// Compute blocks.
    Blocks,
}

impl ShowTarget {
    /// Canonical name as typed by the operator.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Jobs => "jobs",
            Self::Nodes => "nodes",
            Self::Partitions => "partitions",
            Self::Steps => "steps",
            Self::Blocks => "blocks",
        }
    }
}

// ============================================================================
// Update descriptors
// ============================================================================

/// Requested changes to one or more nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeUpdate {
    /// Node name or range expression (e.g. `lx[10-20]`).
    pub node_names: String,
    /// New state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<NodeState>,
    /// Reason recorded with a DOWN/DRAIN/FAIL state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Comma-separated feature list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<String>,
    /// Scheduling weight.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

/// Requested changes to a partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionUpdate {
    /// Partition name.
    pub name: String,
    /// Time limit in minutes, [`INFINITE`] for none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_time: Option<i32>,
    /// Largest job size in nodes, [`INFINITE`] for none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_nodes: Option<i32>,
    /// Smallest job size in nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_nodes: Option<i32>,
    /// Whether this is the default partition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,
    /// Hide from listings unless "all" is requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    /// Only root may submit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_only: Option<bool>,
    /// Node sharing policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared: Option<SharedMode>,
    /// Availability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<PartitionState>,
    /// Member nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<String>,
    /// Groups allowed to use the partition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_groups: Option<String>,
}

/// Requested changes to a pending or running job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobUpdate {
    /// Job to modify.
    pub job_id: JobId,
    /// Scheduling priority.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    /// Nice adjustment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nice: Option<i32>,
    /// Time limit in minutes, [`INFINITE`] for none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<i32>,
    /// Minimum node count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_nodes: Option<i32>,
    /// Minimum processor count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_procs: Option<i32>,
    /// Minimum memory per node in MiB.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_memory: Option<i32>,
    /// Target partition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    /// Job name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Nodes the job must run on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub req_nodes: Option<String>,
    /// Nodes the job must avoid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exc_nodes: Option<String>,
    /// Required node features.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<String>,
    /// Charge account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    /// Job this one depends on, 0 clears the dependency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependency: Option<i32>,
    /// Require contiguous nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contiguous: Option<bool>,
}

impl JobUpdate {
    /// An update for `job_id` that changes nothing yet.
    #[must_use]
    pub const fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            priority: None,
            nice: None,
            time_limit: None,
            min_nodes: None,
            min_procs: None,
            min_memory: None,
            partition: None,
            name: None,
            req_nodes: None,
            exc_nodes: None,
            features: None,
            account: None,
            dependency: None,
            contiguous: None,
        }
    }
}

/// Requested state change for a compute block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockUpdate {
    /// Block name.
    pub name: String,
    /// New state.
    pub state: BlockState,
}

// ============================================================================
// Records
// ============================================================================

/// One entity as reported by the controller: ordered `key=value` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Vec<(String, String)>);

impl Record {
    /// Create an empty record.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a field, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.push((key.into(), value.into()));
        self
    }

    /// Fields in controller order.
    #[must_use]
    pub fn fields(&self) -> &[(String, String)] {
        &self.0
    }

    /// Look up a field value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}
