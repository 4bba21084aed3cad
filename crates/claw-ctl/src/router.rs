//! Decide which entity an `update` specification targets.

use std::fmt;

use thiserror::Error;
use tracing::debug;

/// Entity kinds an update can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// Compute node(s).
    Node,
    /// Partition.
    Partition,
    /// Job.
    Job,
    /// Compute block.
    Block,
}

/// Identifying keys, checked against each word in turn.
const IDENTIFYING_KEYS: &[(&str, EntityKind)] = &[
    ("NodeName=", EntityKind::Node),
    ("PartitionName=", EntityKind::Partition),
    ("JobId=", EntityKind::Job),
    ("BlockName=", EntityKind::Block),
];

impl EntityKind {
    /// The `Key=` prefix that identifies this kind.
    #[must_use]
    pub fn identifying_key(self) -> &'static str {
        IDENTIFYING_KEYS
            .iter()
            .find(|(_, kind)| *kind == self)
            .map_or("", |(key, _)| key)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Node => "node",
            Self::Partition => "partition",
            Self::Job => "job",
            Self::Block => "block",
        })
    }
}

/// No word carries an identifying key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No valid entity in update command\nInput line must include \"NodeName\", \"PartitionName\", \"JobId\", or \"BlockName\"")]
pub struct RouteError;

/// Return the entity kind of the first word that starts with an identifying
/// key. Position decides, not key priority.
///
/// # Errors
///
/// Returns [`RouteError`] if no word starts with an identifying key.
pub fn route<S: AsRef<str>>(words: &[S]) -> Result<EntityKind, RouteError> {
    for word in words {
        let word = word.as_ref();
        let hit = IDENTIFYING_KEYS.iter().find(|(key, _)| {
            word.get(..key.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(key))
        });
        if let Some((_, kind)) = hit {
            debug!(%kind, word, "routed update");
            return Ok(*kind);
        }
    }
    Err(RouteError)
}
