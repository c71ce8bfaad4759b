// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`process`]: every external command (`sass`, `python manage.py ...`,
//!   user shell tasks) goes through `CommandRunner`, so callers can be tested
//!   with a fake runner that never spawns anything.
//! - [`backend`]: the `BuildBackend` trait the watch runtime uses to start
//!   style builds, and the production `PipelineBuildBackend`.

pub mod backend;
pub mod process;

pub use backend::{BuildBackend, PipelineBuildBackend};
pub use process::{CommandOutput, CommandRunner, Invocation, ProcessRunner};
