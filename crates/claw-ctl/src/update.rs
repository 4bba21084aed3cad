//! Turn `update` and `delete` specifications into controller requests.
//!
//! Each entity has its own field list. The whole specification must be
//! understood before a request is built: any fragment left after extraction
//! fails the command and nothing is sent.

use claw_ctl_proto::{
    BlockState, BlockUpdate, ControlRequest, JobId, JobUpdate, NodeState, NodeUpdate,
    PartitionState, PartitionUpdate, SharedMode,
};
use tracing::debug;

use crate::error::CliError;
use crate::router::{route, EntityKind};
use crate::spec_parser::{Field, SpecText};

/// Build the request for `update <spec>`.
///
/// # Errors
///
/// Fails if no entity is identified, a value is malformed, or part of the
/// specification is not understood.
pub fn build_update<S: AsRef<str>>(words: &[S]) -> Result<ControlRequest, CliError> {
    let kind = route(words)?;
    let mut spec = SpecText::from_tokens(words);
    let request = match kind {
        EntityKind::Node => ControlRequest::UpdateNode(node_update(&mut spec)?),
        EntityKind::Partition => ControlRequest::UpdatePartition(partition_update(&mut spec)?),
        EntityKind::Job => ControlRequest::UpdateJob(job_update(&mut spec)?),
        EntityKind::Block => ControlRequest::UpdateBlock(block_update(&mut spec)?),
    };
    debug!(request = request.request_type(), "built update");
    Ok(request)
}

/// Build the request for `delete <spec>`. Only partitions can be deleted.
///
/// # Errors
///
/// Fails with [`CliError::InvalidDeletion`] for any other entity.
pub fn build_delete<S: AsRef<str>>(words: &[S]) -> Result<ControlRequest, CliError> {
    let first = words.first().map_or("", |w| w.as_ref());
    if route(words).ok() != Some(EntityKind::Partition) {
        return Err(CliError::InvalidDeletion(first.to_string()));
    }
    let mut spec = SpecText::from_tokens(words);
    let mut name = None;
    spec.extract(&mut [Field::string("PartitionName", &mut name)])?;
    reject_residual(&spec)?;
    Ok(ControlRequest::DeletePartition {
        name: required(name, "PartitionName")?,
    })
}

fn node_update(spec: &mut SpecText) -> Result<NodeUpdate, CliError> {
    let (mut names, mut state, mut reason, mut features, mut weight) =
        (None, None, None, None, None);
    spec.extract(&mut [
        Field::string("NodeName", &mut names),
        Field::string("State", &mut state),
        Field::string("Reason", &mut reason),
        Field::string("Features", &mut features),
        Field::int("Weight", &mut weight),
    ])?;
    reject_residual(spec)?;

    let state = state.as_deref().map(str::parse::<NodeState>).transpose()?;
    match state {
        Some(state) if state.requires_reason() && reason.as_deref().is_none_or(str::is_empty) => {
            return Err(CliError::InvalidInput(format!(
                "a Reason is required to set nodes {state}"
            )));
        }
        _ => {}
    }
    let weight = weight
        .map(|w| u32::try_from(w).map_err(|_| CliError::InvalidInput(format!("Weight={w}"))))
        .transpose()?;

    Ok(NodeUpdate {
        node_names: required(names, "NodeName")?,
        state,
        reason,
        features,
        weight,
    })
}

fn partition_update(spec: &mut SpecText) -> Result<PartitionUpdate, CliError> {
    let mut name = None;
    let (mut max_time, mut max_nodes, mut min_nodes) = (None, None, None);
    let (mut default, mut hidden, mut root_only, mut shared, mut state) =
        (None, None, None, None, None);
    let (mut nodes, mut allow_groups) = (None, None);
    spec.extract(&mut [
        Field::string("PartitionName", &mut name),
        Field::int("MaxTime", &mut max_time),
        Field::int("MaxNodes", &mut max_nodes),
        Field::int("MinNodes", &mut min_nodes),
        Field::string("Default", &mut default),
        Field::string("Hidden", &mut hidden),
        Field::string("RootOnly", &mut root_only),
        Field::string("Shared", &mut shared),
        Field::string("State", &mut state),
        Field::string("Nodes", &mut nodes),
        Field::string("AllowGroups", &mut allow_groups),
    ])?;
    reject_residual(spec)?;

    Ok(PartitionUpdate {
        name: required(name, "PartitionName")?,
        max_time,
        max_nodes,
        min_nodes,
        default: yes_no("Default", default.as_deref())?,
        hidden: yes_no("Hidden", hidden.as_deref())?,
        root_only: yes_no("RootOnly", root_only.as_deref())?,
        shared: shared.as_deref().map(str::parse::<SharedMode>).transpose()?,
        state: state.as_deref().map(str::parse::<PartitionState>).transpose()?,
        nodes,
        allow_groups,
    })
}

fn job_update(spec: &mut SpecText) -> Result<JobUpdate, CliError> {
    let mut job_id = None;
    let mut priority = None;
    let (mut nice, mut time_limit, mut min_nodes, mut min_procs, mut min_memory, mut dependency) =
        (None, None, None, None, None, None);
    let (mut partition, mut name, mut req_nodes, mut exc_nodes, mut features, mut account) =
        (None, None, None, None, None, None);
    let mut contiguous = None;
    spec.extract(&mut [
        Field::string("JobId", &mut job_id),
        Field::long("Priority", &mut priority),
        Field::int("Nice", &mut nice),
        Field::int("TimeLimit", &mut time_limit),
        Field::int("MinNodes", &mut min_nodes),
        Field::int("MinProcs", &mut min_procs),
        Field::int("MinMemory", &mut min_memory),
        Field::string("Partition", &mut partition),
        Field::string("Name", &mut name),
        Field::string("ReqNodeList", &mut req_nodes),
        Field::string("ExcNodeList", &mut exc_nodes),
        Field::string("Features", &mut features),
        Field::string("Account", &mut account),
        Field::int("Dependency", &mut dependency),
        Field::string("Contiguous", &mut contiguous),
    ])?;
    reject_residual(spec)?;

    let job_id = JobId::parse(&required(job_id, "JobId")?)?;
    Ok(JobUpdate {
        priority,
        nice,
        time_limit,
        min_nodes,
        min_procs,
        min_memory,
        partition,
        name,
        req_nodes,
        exc_nodes,
        features,
        account,
        dependency,
        contiguous: yes_no("Contiguous", contiguous.as_deref())?,
        ..JobUpdate::new(job_id)
    })
}

fn block_update(spec: &mut SpecText) -> Result<BlockUpdate, CliError> {
    let (mut name, mut state) = (None, None);
    spec.extract(&mut [
        Field::string("BlockName", &mut name),
        Field::string("State", &mut state),
    ])?;
    reject_residual(spec)?;

    Ok(BlockUpdate {
        name: required(name, "BlockName")?,
        state: required(state, "State")?.parse::<BlockState>()?,
    })
}

fn reject_residual(spec: &SpecText) -> Result<(), CliError> {
    match spec.residual() {
        Some(fragment) => Err(CliError::InvalidInput(fragment.to_string())),
        None => Ok(()),
    }
}

fn required(value: Option<String>, keyword: &str) -> Result<String, CliError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CliError::InvalidInput(format!("{keyword} must be specified")))
}

fn yes_no(keyword: &str, value: Option<&str>) -> Result<Option<bool>, CliError> {
    match value {
        None => Ok(None),
        Some(v) if v.eq_ignore_ascii_case("YES") => Ok(Some(true)),
        Some(v) if v.eq_ignore_ascii_case("NO") => Ok(Some(false)),
        Some(v) => Err(CliError::InvalidInput(format!(
            "{keyword}={v}, acceptable values are YES and NO"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claw_ctl_proto::INFINITE;
    use test_case::test_case;

    fn words(line: &str) -> Vec<String> {
        crate::tokenizer::split_words(line, 128).unwrap()
    }

    #[test]
    fn node_update_with_quoted_reason() {
        let request = build_update(&words("NodeName=lx[01-02] State=drain Reason=\"fan failed\"")).unwrap();
        assert_eq!(
            request,
            ControlRequest::UpdateNode(NodeUpdate {
                node_names: "lx[01-02]".into(),
                state: Some(NodeState::Drain),
                reason: Some("fan failed".into()),
                ..NodeUpdate::default()
            })
        );
    }

    #[test_case("DOWN" ; "down")]
    #[test_case("DRAIN" ; "drain")]
    #[test_case("FAIL" ; "fail")]
    fn node_state_needs_reason(state: &str) {
        let err = build_update(&words(&format!("NodeName=lx01 State={state}"))).unwrap_err();
        assert!(matches!(err, CliError::InvalidInput(_)));
    }

    #[test]
    fn node_resume_needs_no_reason() {
        let request = build_update(&words("NodeName=lx01 State=RESUME Weight=5")).unwrap();
        let ControlRequest::UpdateNode(update) = request else {
            panic!("expected node update");
        };
        assert_eq!(update.state, Some(NodeState::Resume));
        assert_eq!(update.weight, Some(5));
    }

    #[test]
    fn node_bad_state_lists_alternatives() {
        let err = build_update(&words("NodeName=lx01 State=ASLEEP")).unwrap_err();
        assert!(err.to_string().contains("acceptable values"));
    }

    #[test]
    fn negative_weight_rejected() {
        assert!(build_update(&words("NodeName=lx01 Weight=-3")).is_err());
    }

    #[test]
    fn residual_fragment_is_rejected() {
        let err = build_update(&words("NodeName=lx01 Bogus=1")).unwrap_err();
        assert_eq!(err.to_string(), "invalid input: Bogus=1");
    }

    #[test]
    fn second_identifying_key_is_residual() {
        let err = build_update(&words("JobId=5 NodeName=x")).unwrap_err();
        assert_eq!(err.to_string(), "invalid input: NodeName=x");
    }

    #[test]
    fn trailing_backslash_does_not_swallow_next_fragment() {
        let request = build_update(&["JobId=5", "Name=a\\", "Partition=batch"]).unwrap();
        let ControlRequest::UpdateJob(update) = request else {
            panic!("expected job update");
        };
        assert_eq!(update.name.as_deref(), Some("a\\"));
        assert_eq!(update.partition.as_deref(), Some("batch"));
    }

    #[test]
    fn partition_update_fields() {
        let request = build_update(&words(
            "PartitionName=debug MaxTime=UNLIMITED MaxNodes=16 Hidden=yes Shared=force State=DOWN",
        ))
        .unwrap();
        assert_eq!(
            request,
            ControlRequest::UpdatePartition(PartitionUpdate {
                name: "debug".into(),
                max_time: Some(INFINITE),
                max_nodes: Some(16),
                hidden: Some(true),
                shared: Some(SharedMode::Force),
                state: Some(PartitionState::Down),
                ..PartitionUpdate::default()
            })
        );
    }

    #[test]
    fn partition_yes_no_is_strict() {
        let err = build_update(&words("PartitionName=debug Default=maybe")).unwrap_err();
        assert!(err.to_string().contains("YES and NO"));
    }

    #[test]
    fn job_update_fields() {
        let request = build_update(&words(
            "JobId=42 Priority=99999999999 TimeLimit=30min Partition=batch Name=sim Contiguous=NO",
        ))
        .unwrap();
        let ControlRequest::UpdateJob(update) = request else {
            panic!("expected job update");
        };
        assert_eq!(update.job_id, JobId::new(42));
        assert_eq!(update.priority, Some(99_999_999_999));
        assert_eq!(update.time_limit, Some(30));
        assert_eq!(update.partition.as_deref(), Some("batch"));
        assert_eq!(update.name.as_deref(), Some("sim"));
        assert_eq!(update.contiguous, Some(false));
    }

    #[test]
    fn job_id_must_be_numeric() {
        let err = build_update(&words("JobId=abc")).unwrap_err();
        assert!(matches!(err, CliError::InvalidInput(_)));
    }

    #[test]
    fn malformed_number_is_spec_error() {
        let err = build_update(&words("JobId=3 Nice=lots")).unwrap_err();
        assert!(matches!(err, CliError::Spec(_)));
    }

    #[test]
    fn block_update() {
        let request = build_update(&words("BlockName=RMP0 State=free")).unwrap();
        assert_eq!(
            request,
            ControlRequest::UpdateBlock(BlockUpdate {
                name: "RMP0".into(),
                state: BlockState::Free,
            })
        );
        assert!(build_update(&words("BlockName=RMP0")).is_err());
    }

    #[test]
    fn update_without_entity() {
        let err = build_update(&words("State=DOWN")).unwrap_err();
        assert!(matches!(err, CliError::Route(_)));
    }

    #[test]
    fn delete_partition() {
        assert_eq!(
            build_delete(&words("PartitionName=debug")).unwrap(),
            ControlRequest::DeletePartition {
                name: "debug".into()
            }
        );
    }

    #[test_case("NodeName=lx01" ; "node")]
    #[test_case("JobId=4" ; "job")]
    #[test_case("Bogus" ; "nothing")]
    fn delete_other_entities(spec: &str) {
        let err = build_delete(&words(spec)).unwrap_err();
        assert_eq!(err.to_string(), format!("invalid deletion entity: {spec}"));
    }

    #[test]
    fn delete_with_extra_fields() {
        let err = build_delete(&words("PartitionName=debug State=UP")).unwrap_err();
        assert_eq!(err.to_string(), "invalid input: State=UP");
    }
}
