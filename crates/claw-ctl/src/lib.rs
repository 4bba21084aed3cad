//! # claw-ctl
//!
//! Administration client for the Clawbernetes controller.
//!
//! Operator input flows through a small pipeline:
//!
//! ```text
//! line ─► Tokenizer ─► words ─► Dispatcher ─► handler
//!                                               │ update / delete
//!                                               ▼
//!                                   EntityRouter ─► SpecParser ─► ControlRequest
//! ```
//!
//! Requests travel to the controller as JSON over WebSocket, using the
//! messages defined in `claw-ctl-proto`. [`client::Controller`] is the seam
//! between command handling and the network.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod client;
pub mod commands;
pub mod dispatch;
pub mod error;
pub mod input;
pub mod interpreter;
pub mod output;
pub mod router;
pub mod session;
pub mod spec_parser;
pub mod tokenizer;
pub mod update;
pub mod usage;

pub use cli::{Cli, Config};
pub use client::{Controller, RemoteController};
pub use dispatch::{dispatch, CommandSpec, Context, ExitSignal, COMMANDS};
pub use error::CliError;
pub use interpreter::Interpreter;
pub use router::{route, EntityKind, RouteError};
pub use session::{Session, Verbosity};
pub use spec_parser::{Field, SpecError, SpecText};
pub use tokenizer::{Tokenizer, MAX_INPUT_FIELDS};
