//! Command handlers.
//!
//! Each handler receives the words that passed the arity check, command
//! word first. Session commands only flip flags; the rest build exactly one
//! controller request and print what comes back.

use claw_ctl_proto::{
    CheckpointOp, ControlRequest, ControlResponse, ControllerRole, JobId, ShowTarget, StepId,
    CONTROL_PROTOCOL_VERSION,
};

use crate::dispatch::Context;
use crate::error::CliError;
use crate::output::{Layout, Message, PidReport, PingReport, RecordList, Report};
use crate::session::Verbosity;
use crate::update::{build_delete, build_update};
use crate::usage::USAGE;

/// Shortest accepted abbreviation of a `show` entity.
const SHOW_ABBREV: usize = 3;

const SHOW_TARGETS: &[ShowTarget] = &[
    ShowTarget::Config,
    ShowTarget::Jobs,
    ShowTarget::Nodes,
    ShowTarget::Partitions,
    ShowTarget::Steps,
    ShowTarget::Blocks,
];

fn unexpected(request: &str, response: &ControlResponse) -> CliError {
    CliError::Protocol(format!("unexpected response to {request}: {response:?}"))
}

fn layout(ctx: &Context<'_>) -> Layout {
    Layout::from_one_liner(ctx.session.one_liner)
}

/// Send a request that only needs an acknowledgement.
fn send_ack(ctx: &mut Context<'_>, request: ControlRequest) -> Result<(), CliError> {
    let request_type = request.request_type();
    match ctx.controller.send(request)? {
        ControlResponse::Ack => {
            if ctx.session.is_verbose() {
                Message::new(format!("{request_type} accepted"))
                    .write_report(&mut ctx.out, Layout::OneLine)?;
            }
            Ok(())
        }
        other => Err(unexpected(request_type, &other)),
    }
}

fn job_id(word: &str) -> Result<JobId, CliError> {
    Ok(JobId::parse(word)?)
}

/// `abort`
pub fn abort(ctx: &mut Context<'_>, _words: &[String]) -> Result<(), CliError> {
    send_ack(ctx, ControlRequest::Shutdown { core: true })
}

/// `all`
pub fn all(ctx: &mut Context<'_>, _words: &[String]) -> Result<(), CliError> {
    ctx.session.all = true;
    Ok(())
}

/// `hide`
pub fn hide(ctx: &mut Context<'_>, _words: &[String]) -> Result<(), CliError> {
    ctx.session.all = false;
    Ok(())
}

/// `checkpoint <op> <job[.step]>`
pub fn checkpoint(ctx: &mut Context<'_>, words: &[String]) -> Result<(), CliError> {
    let op: CheckpointOp = words[1].parse()?;
    let step = StepId::parse(&words[2])?;
    match ctx.controller.send(ControlRequest::Checkpoint { op, step })? {
        ControlResponse::CheckpointStatus { status } => {
            let text = format!("{step}: {status}");
            Message::new(text).write_report(&mut ctx.out, Layout::OneLine)
        }
        ControlResponse::Ack => {
            if ctx.session.is_verbose() {
                Message::new(format!("checkpoint {op} {step} accepted"))
                    .write_report(&mut ctx.out, Layout::OneLine)?;
            }
            Ok(())
        }
        other => Err(unexpected("checkpoint", &other)),
    }
}

/// `completing`
pub fn completing(ctx: &mut Context<'_>, _words: &[String]) -> Result<(), CliError> {
    match ctx.controller.send(ControlRequest::ListCompleting)? {
        ControlResponse::Records { records } => {
            let layout = layout(ctx);
            RecordList {
                what: "completing jobs",
                records: &records,
            }
            .write_report(&mut ctx.out, layout)
        }
        other => Err(unexpected("completing", &other)),
    }
}

/// `delete <spec>`
pub fn delete(ctx: &mut Context<'_>, words: &[String]) -> Result<(), CliError> {
    let request = build_delete(&words[1..])?;
    send_ack(ctx, request)
}

/// `exit`, `quit`
pub fn exit(ctx: &mut Context<'_>, _words: &[String]) -> Result<(), CliError> {
    ctx.session.request_exit();
    Ok(())
}

/// `help`
pub fn help(ctx: &mut Context<'_>, _words: &[String]) -> Result<(), CliError> {
    ctx.out.write_all(USAGE.as_bytes())?;
    Ok(())
}

/// `oneliner`
pub fn oneliner(ctx: &mut Context<'_>, _words: &[String]) -> Result<(), CliError> {
    ctx.session.one_liner = true;
    Ok(())
}

/// `pidinfo <pid>`
pub fn pidinfo(ctx: &mut Context<'_>, words: &[String]) -> Result<(), CliError> {
    let pid: u32 = words[1]
        .parse()
        .map_err(|_| CliError::InvalidInput(format!("invalid pid: {}", words[1])))?;
    match ctx.controller.send(ControlRequest::PidInfo { pid })? {
        ControlResponse::JobForPid {
            job_id,
            remaining_secs,
        } => PidReport {
            pid,
            job_id,
            remaining_secs,
        }
        .write_report(&mut ctx.out, Layout::OneLine),
        other => Err(unexpected("pidinfo", &other)),
    }
}

/// `ping`: probe the primary, then the backup.
pub fn ping(ctx: &mut Context<'_>, _words: &[String]) -> Result<(), CliError> {
    let primary_up = ctx.controller.ping(ControllerRole::Primary);
    let backup_up = ctx.controller.ping(ControllerRole::Backup);
    PingReport {
        primary: ctx
            .controller
            .address(ControllerRole::Primary)
            .unwrap_or_default()
            .to_string(),
        backup: ctx.controller.address(ControllerRole::Backup).map(str::to_string),
        primary_up,
        backup_up,
    }
    .write_report(&mut ctx.out, Layout::OneLine)
}

/// `quiet`
pub fn quiet(ctx: &mut Context<'_>, _words: &[String]) -> Result<(), CliError> {
    ctx.session.verbosity = Verbosity::Quiet;
    Ok(())
}

/// `verbose`
pub fn verbose(ctx: &mut Context<'_>, _words: &[String]) -> Result<(), CliError> {
    ctx.session.verbosity = Verbosity::Verbose;
    Ok(())
}

/// `reconfigure`
pub fn reconfigure(ctx: &mut Context<'_>, _words: &[String]) -> Result<(), CliError> {
    send_ack(ctx, ControlRequest::Reconfigure)
}

/// `requeue <job_id>`
pub fn requeue(ctx: &mut Context<'_>, words: &[String]) -> Result<(), CliError> {
    let job_id = job_id(&words[1])?;
    send_ack(ctx, ControlRequest::Requeue { job_id })
}

/// `resume <job_id>`
pub fn resume(ctx: &mut Context<'_>, words: &[String]) -> Result<(), CliError> {
    let job_id = job_id(&words[1])?;
    send_ack(ctx, ControlRequest::Resume { job_id })
}

/// `suspend <job_id>`
pub fn suspend(ctx: &mut Context<'_>, words: &[String]) -> Result<(), CliError> {
    let job_id = job_id(&words[1])?;
    send_ack(ctx, ControlRequest::Suspend { job_id })
}

/// `shutdown`
pub fn shutdown(ctx: &mut Context<'_>, _words: &[String]) -> Result<(), CliError> {
    send_ack(ctx, ControlRequest::Shutdown { core: false })
}

/// Resolve a `show` entity word, abbreviable to three letters.
fn show_target(word: &str) -> Option<ShowTarget> {
    SHOW_TARGETS.iter().copied().find(|target| {
        let name = target.name();
        word.len() >= SHOW_ABBREV
            && word.len() <= name.len()
            && name.as_bytes()[..word.len()].eq_ignore_ascii_case(word.as_bytes())
    })
}

/// `show <entity> [id]`
pub fn show(ctx: &mut Context<'_>, words: &[String]) -> Result<(), CliError> {
    let target = show_target(&words[1]).ok_or_else(|| CliError::InvalidEntity {
        entity: words[1].clone(),
        keyword: words[0].clone(),
    })?;
    let id = words.get(2).cloned();
    if let Some(id) = &id {
        match target {
            ShowTarget::Jobs => {
                JobId::parse(id)?;
            }
            ShowTarget::Steps => {
                StepId::parse(id)?;
            }
            _ => {}
        }
    }

    let request = ControlRequest::Show {
        target,
        id,
        include_hidden: ctx.session.all,
    };
    match ctx.controller.send(request)? {
        ControlResponse::Records { records } => {
            let layout = layout(ctx);
            RecordList {
                what: target.name(),
                records: &records,
            }
            .write_report(&mut ctx.out, layout)
        }
        other => Err(unexpected("show", &other)),
    }
}

/// `update <spec>`
pub fn update(ctx: &mut Context<'_>, words: &[String]) -> Result<(), CliError> {
    let request = build_update(&words[1..])?;
    send_ack(ctx, request)
}

/// `version`
pub fn version(ctx: &mut Context<'_>, _words: &[String]) -> Result<(), CliError> {
    Message::new(format!("clawctl {}", env!("CARGO_PKG_VERSION")))
        .write_report(&mut ctx.out, Layout::OneLine)?;
    if ctx.session.is_verbose() {
        Message::new(format!("control protocol version {CONTROL_PROTOCOL_VERSION}"))
            .write_report(&mut ctx.out, Layout::OneLine)?;
    }
    Ok(())
}
