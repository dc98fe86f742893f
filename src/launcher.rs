//! Launching the acquisition executable.
//!
//! The child runs to completion while the caller blocks. Whatever happens to
//! it (not found, crashed, nonzero exit) is folded into the exit code of the
//! returned [`LaunchReport`]; nothing here returns an error.

use crate::command::{CommandLine, LaunchMode};
use crate::models::{report::LaunchReport, request::InvocationRequest};
use chrono::Utc;
use serde::Deserialize;
use smol::process::{Command, ExitStatus};
use std::io;
use tracing::{debug, error, info, warn};

/// Exit code reported when the program could not be found.
const NOT_FOUND: i32 = 127;
/// Exit code reported when the program could not be executed.
const NOT_EXECUTABLE: i32 = 126;

/// How the assembled command line is turned into a process.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", deny_unknown_fields)]
pub enum Spawner {
    /// `<shell> -c "<command line>"`, the semantics of a C `system()` call.
    Shell {
        #[serde(default = "default_shell")]
        shell: String,
    },
    /// Spawn the tokens directly, without a shell.
    Exec,
}

fn default_shell() -> String {
    String::from("/bin/sh")
}

impl Default for Spawner {
    fn default() -> Self {
        Spawner::Shell {
            shell: default_shell(),
        }
    }
}

/// Everything that decides how a request is launched, apart from its values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchSettings {
    pub mode: LaunchMode,
    pub spawner: Spawner,
}

/// Builds the command line for `request`, hands it to `announce`, then runs
/// it and blocks until the child exits.
pub fn dispatch<F>(request: &InvocationRequest, settings: &LaunchSettings, announce: F) -> LaunchReport
where
    F: FnOnce(&CommandLine),
{
    let command = CommandLine::build(request, &settings.mode);
    announce(&command);
    smol::block_on(launch(&command, &settings.spawner))
}

/// Runs `command` and waits for it.
#[tracing::instrument(skip_all, fields(spawner = ?spawner))]
pub async fn launch(command: &CommandLine, spawner: &Spawner) -> LaunchReport {
    let started_at = Utc::now();
    info!("Starting 4D Ultrasound: {}", command);

    let outcome = match build_process(command, spawner) {
        Some(mut process) => process.status().await,
        None => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "empty command line",
        )),
    };
    let finished_at = Utc::now();

    let (exit_code, spawn_error) = match outcome {
        Ok(status) => (exit_code_of(status), None),
        Err(e) => {
            error!("Failed to start '{}': {}", command, e);
            (spawn_failure_code(&e), Some(e.to_string()))
        }
    };

    if exit_code == 0 {
        debug!("4D Ultrasound exited cleanly");
    } else {
        warn!("4D Ultrasound exited with status {}", exit_code);
    }

    LaunchReport {
        command_line: command.render(),
        argv: command.tokens().to_vec(),
        exit_code,
        success: exit_code == 0,
        spawn_error,
        started_at,
        finished_at,
    }
}

fn build_process(command: &CommandLine, spawner: &Spawner) -> Option<Command> {
    match spawner {
        Spawner::Shell { shell } => {
            let mut process = Command::new(shell);
            process.arg("-c").arg(command.render());
            Some(process)
        }
        Spawner::Exec => {
            let (program, args) = command.tokens().split_first()?;
            let mut process = Command::new(program);
            process.args(args);
            Some(process)
        }
    }
}

fn spawn_failure_code(error: &io::Error) -> i32 {
    match error.kind() {
        io::ErrorKind::NotFound => NOT_FOUND,
        io::ErrorKind::PermissionDenied => NOT_EXECUTABLE,
        _ => 1,
    }
}

#[cfg(unix)]
fn exit_code_of(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code_of(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}
